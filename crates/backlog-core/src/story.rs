use crate::error::{BacklogError, Result};
use crate::invest::Validation;
use crate::paths;
use crate::types::{Priority, Status};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Statement
// ---------------------------------------------------------------------------

/// The narrative "as a / I want / so that" triple.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statement {
    #[serde(default)]
    pub as_a: String,
    #[serde(default)]
    pub i_want: String,
    #[serde(default)]
    pub so_that: String,
}

// ---------------------------------------------------------------------------
// AcceptanceCriterion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    pub given: String,
    pub when: String,
    pub then: String,
}

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dependencies {
    #[serde(default)]
    pub blocks: Vec<String>,
    #[serde(default)]
    pub blocked_by: Vec<String>,
}

// ---------------------------------------------------------------------------
// StoryMetadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryMetadata {
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic: Option<String>,
}

// ---------------------------------------------------------------------------
// Story
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub persona: String,
    #[serde(default)]
    pub story: Statement,
    #[serde(default)]
    pub acceptance_criteria: Vec<AcceptanceCriterion>,
    pub metadata: StoryMetadata,
    #[serde(default)]
    pub dependencies: Dependencies,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
}

impl Story {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            persona: String::new(),
            story: Statement::default(),
            acceptance_criteria: Vec::new(),
            metadata: StoryMetadata {
                priority: Priority::Medium,
                story_points: None,
                status: Status::Backlog,
                epic: None,
            },
            dependencies: Dependencies::default(),
            technical_notes: None,
            validation: None,
        }
    }

    pub fn status(&self) -> Status {
        self.metadata.status
    }

    pub fn points(&self) -> Option<u32> {
        self.metadata.story_points
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn load(root: &Path, id: &str) -> Result<Self> {
        let path = paths::story_path(root, id);
        if !path.exists() {
            return Err(BacklogError::StoryNotFound(id.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        let story: Story = serde_yaml::from_str(&data)?;
        Ok(story)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        paths::validate_story_id(&self.id)?;
        let path = paths::story_path(root, &self.id);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Id allocation
// ---------------------------------------------------------------------------

/// Allocate the next story id for `prefix` from the ids already in use.
/// Pure function of the loaded set; no counter file on disk.
pub fn next_story_id<'a>(existing: impl IntoIterator<Item = &'a str>, prefix: &str) -> String {
    let max = existing
        .into_iter()
        .filter_map(paths::split_story_id)
        .filter(|(p, _)| *p == prefix)
        .map(|(_, n)| n)
        .max()
        .unwrap_or(0);
    format!("{prefix}-{:04}", max + 1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
