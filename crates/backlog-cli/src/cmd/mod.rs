pub mod check_deps;
pub mod generate;
pub mod list;
pub mod next_id;
pub mod story_map;
pub mod validate;

use backlog_core::store::StorySet;

/// Surface loader issues as diagnostics without aborting the command.
pub(crate) fn warn_load_issues(set: &StorySet) {
    for issue in set.issues() {
        tracing::warn!("{}: {}", issue.file.display(), issue.message);
    }
}
