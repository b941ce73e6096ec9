use anyhow::Context;
use backlog_core::store::StorySet;
use backlog_core::{io, paths, render};
use std::path::{Path, PathBuf};

/// Render one Markdown document per story into `stories/generated-docs/`,
/// mirroring source filenames 1:1. Existing documents are kept unless
/// `--force` is given; every write is atomic.
pub fn run(root: &Path, force: bool) -> anyhow::Result<i32> {
    let set = StorySet::load(root).context("failed to load stories")?;
    super::warn_load_issues(&set);

    io::ensure_dir(&paths::generated_dir(root))?;

    let mut written = 0usize;
    let mut skipped = 0usize;
    for story in set.stories() {
        let source = set
            .source_file(&story.id)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(format!("{}.yaml", story.id)));
        let target = paths::generated_doc_path(root, &source);
        let doc = render::story_doc(story);

        let wrote = if force {
            io::atomic_write(&target, doc.as_bytes())
                .with_context(|| format!("failed to write {}", target.display()))?;
            true
        } else {
            io::write_if_missing(&target, doc.as_bytes())
                .with_context(|| format!("failed to write {}", target.display()))?
        };
        if wrote {
            written += 1;
        } else {
            skipped += 1;
        }
    }

    println!("{written} documents written, {skipped} skipped");
    Ok(0)
}
