use crate::error::{BacklogError, Result};
use crate::paths;
use crate::story::Story;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// LoadIssue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// File unreadable or not valid YAML for the story shape.
    Parse,
    /// A required field is present but unusable (bad id, empty title).
    Shape,
    /// Same id seen in more than one file.
    DuplicateId,
    /// blocks/blocked_by pair is not mirrored on the other story.
    AsymmetricLink,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadIssue {
    pub file: PathBuf,
    pub kind: IssueKind,
    pub message: String,
}

// ---------------------------------------------------------------------------
// StorySet
// ---------------------------------------------------------------------------

/// All stories loaded from `stories/yaml-source/`, keyed by id.
///
/// Files are visited in sorted filename order; on a duplicate id the
/// first-seen record wins and the later file is reported as an issue.
/// A malformed file never aborts the batch.
#[derive(Debug, Default)]
pub struct StorySet {
    stories: BTreeMap<String, Story>,
    files: BTreeMap<String, PathBuf>,
    issues: Vec<LoadIssue>,
}

impl StorySet {
    pub fn load(root: &Path) -> Result<Self> {
        let dir = paths::source_dir(root);
        if !dir.is_dir() {
            return Err(BacklogError::SourceDirMissing(dir.display().to_string()));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml")
                )
            })
            .collect();
        files.sort();

        let mut set = StorySet::default();
        for file in files {
            set.load_file(&file);
        }
        set.check_link_symmetry();
        Ok(set)
    }

    fn load_file(&mut self, file: &Path) {
        let data = match std::fs::read_to_string(file) {
            Ok(d) => d,
            Err(e) => {
                self.push_issue(file, IssueKind::Parse, format!("unreadable: {e}"));
                return;
            }
        };

        let story: Story = match serde_yaml::from_str(&data) {
            Ok(s) => s,
            Err(e) => {
                self.push_issue(file, IssueKind::Parse, e.to_string());
                return;
            }
        };

        if let Err(e) = paths::validate_story_id(&story.id) {
            self.push_issue(file, IssueKind::Shape, e.to_string());
            return;
        }
        if story.title.trim().is_empty() {
            self.push_issue(file, IssueKind::Shape, format!("{}: title is empty", story.id));
            return;
        }

        if self.stories.contains_key(&story.id) {
            self.push_issue(
                file,
                IssueKind::DuplicateId,
                format!("duplicate id {} (first-seen record kept)", story.id),
            );
            return;
        }
        self.files.insert(story.id.clone(), file.to_path_buf());
        self.stories.insert(story.id.clone(), story);
    }

    /// Report blocks/blocked_by pairs that are not mirrored. Report-only:
    /// auto-repair could mask intent, so the records are left as written.
    fn check_link_symmetry(&mut self) {
        let mut issues = Vec::new();
        for story in self.stories.values() {
            for blocker in &story.dependencies.blocked_by {
                if let Some(other) = self.stories.get(blocker) {
                    if !other.dependencies.blocks.contains(&story.id) {
                        issues.push((
                            story.id.clone(),
                            format!(
                                "{} lists {} in blocked_by but {} does not list {} in blocks",
                                story.id, blocker, blocker, story.id
                            ),
                        ));
                    }
                }
            }
            for blocked in &story.dependencies.blocks {
                if let Some(other) = self.stories.get(blocked) {
                    if !other.dependencies.blocked_by.contains(&story.id) {
                        issues.push((
                            story.id.clone(),
                            format!(
                                "{} lists {} in blocks but {} does not list {} in blocked_by",
                                story.id, blocked, blocked, story.id
                            ),
                        ));
                    }
                }
            }
        }
        for (id, message) in issues {
            let file = self
                .files
                .get(&id)
                .cloned()
                .unwrap_or_else(|| PathBuf::from(format!("{id}.yaml")));
            self.issues.push(LoadIssue {
                file,
                kind: IssueKind::AsymmetricLink,
                message,
            });
        }
    }

    fn push_issue(&mut self, file: &Path, kind: IssueKind, message: String) {
        self.issues.push(LoadIssue {
            file: file.to_path_buf(),
            kind,
            message,
        });
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn get(&self, id: &str) -> Option<&Story> {
        self.stories.get(id)
    }

    /// Source file a story was loaded from. Absent for sets built in memory.
    pub fn source_file(&self, id: &str) -> Option<&Path> {
        self.files.get(id).map(PathBuf::as_path)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.stories.contains_key(id)
    }

    /// Stories in id order.
    pub fn stories(&self) -> impl Iterator<Item = &Story> {
        self.stories.values()
    }

    /// Ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.stories.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    pub fn issues(&self) -> &[LoadIssue] {
        &self.issues
    }

    /// Build a set directly from records, bypassing the filesystem. Later
    /// duplicates are dropped, matching the loader's first-seen rule.
    pub fn from_stories(stories: impl IntoIterator<Item = Story>) -> Self {
        let mut set = StorySet::default();
        for s in stories {
            set.stories.entry(s.id.clone()).or_insert(s);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
