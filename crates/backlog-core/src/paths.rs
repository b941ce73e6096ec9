use crate::error::{BacklogError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const STORIES_DIR: &str = "stories";
pub const SOURCE_DIR: &str = "stories/yaml-source";
pub const GENERATED_DIR: &str = "stories/generated-docs";

pub const CONFIG_FILE: &str = "stories/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn source_dir(root: &Path) -> PathBuf {
    root.join(SOURCE_DIR)
}

pub fn generated_dir(root: &Path) -> PathBuf {
    root.join(GENERATED_DIR)
}

pub fn story_path(root: &Path, id: &str) -> PathBuf {
    source_dir(root).join(format!("{id}.yaml"))
}

/// Generated doc path mirroring a source filename 1:1 (`US-0001.yaml` → `US-0001.md`).
pub fn generated_doc_path(root: &Path, source_file: &Path) -> PathBuf {
    let stem = source_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    generated_dir(root).join(format!("{stem}.md"))
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Story id validation
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^[A-Z]{2,8}-[0-9]{1,6}$").unwrap())
}

pub fn validate_story_id(id: &str) -> Result<()> {
    if !id_re().is_match(id) {
        return Err(BacklogError::InvalidStoryId(id.to_string()));
    }
    Ok(())
}

/// Split a story id into (prefix, numeric suffix), e.g. "US-0012" → ("US", 12).
pub fn split_story_id(id: &str) -> Option<(&str, u32)> {
    let (prefix, digits) = id.split_once('-')?;
    let n = digits.parse().ok()?;
    Some((prefix, n))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
