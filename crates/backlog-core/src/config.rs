use crate::error::{BacklogError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// RubricConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubricConfig {
    /// Minimum score (0-100) for a story to pass in non-strict mode.
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: u32,
    /// Stories above this many points fail the Small criterion.
    #[serde(default = "default_max_story_points")]
    pub max_story_points: u32,
    /// Minimum length of `so_that` for the Valuable criterion.
    #[serde(default = "default_min_so_that_len")]
    pub min_so_that_len: usize,
    /// Phrases that fail the Negotiable criterion when present in the
    /// narrative fields. Matched case-insensitively; a heuristic, not a proof.
    #[serde(default = "default_deny_list")]
    pub negotiable_deny_list: Vec<String>,
}

fn default_pass_threshold() -> u32 {
    70
}

fn default_max_story_points() -> u32 {
    8
}

fn default_min_so_that_len() -> usize {
    20
}

fn default_deny_list() -> Vec<String> {
    [
        "must use",
        "must be implemented",
        "only with",
        "has to use",
        "specifically using",
        "hard-coded",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for RubricConfig {
    fn default() -> Self {
        Self {
            pass_threshold: default_pass_threshold(),
            max_story_points: default_max_story_points(),
            min_so_that_len: default_min_so_that_len(),
            negotiable_deny_list: default_deny_list(),
        }
    }
}

// ---------------------------------------------------------------------------
// GraphConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Blocking chains longer than this are reported as warnings.
    #[serde(default = "default_max_chain_length")]
    pub max_chain_length: usize,
    /// Stories directly blocking more than this many others are bottlenecks.
    #[serde(default = "default_bottleneck_threshold")]
    pub bottleneck_threshold: usize,
}

fn default_max_chain_length() -> usize {
    5
}

fn default_bottleneck_threshold() -> usize {
    3
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_chain_length: default_max_chain_length(),
            bottleneck_threshold: default_bottleneck_threshold(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
    #[serde(default)]
    pub rubric: RubricConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

fn default_version() -> u32 {
    1
}

fn default_id_prefix() -> String {
    "US".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            id_prefix: default_id_prefix(),
            rubric: RubricConfig::default(),
            graph: GraphConfig::default(),
        }
    }
}

impl Config {
    /// Load `stories/config.yaml` if present, otherwise built-in defaults.
    /// A malformed file is fatal before any processing begins.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data).map_err(|e| BacklogError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        cfg.validate(&path)?;
        Ok(cfg)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let fail = |message: String| {
            Err(BacklogError::Config {
                path: path.display().to_string(),
                message,
            })
        };
        if self.rubric.pass_threshold > 100 {
            return fail(format!(
                "rubric.pass_threshold must be 0-100, got {}",
                self.rubric.pass_threshold
            ));
        }
        if self.rubric.max_story_points == 0 {
            return fail("rubric.max_story_points must be at least 1".to_string());
        }
        if self.rubric.negotiable_deny_list.iter().any(|p| p.trim().is_empty()) {
            return fail("rubric.negotiable_deny_list contains an empty phrase".to_string());
        }
        if self.graph.max_chain_length == 0 {
            return fail("graph.max_chain_length must be at least 1".to_string());
        }
        if self.id_prefix.is_empty() {
            return fail("id_prefix must not be empty".to_string());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
