use crate::MapFormat;
use anyhow::Context;
use backlog_core::store::StorySet;
use backlog_core::{io, render};
use std::path::Path;

pub fn run(
    root: &Path,
    format: MapFormat,
    epic: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<i32> {
    let set = StorySet::load(root).context("failed to load stories")?;
    super::warn_load_issues(&set);

    let rendered = match format {
        MapFormat::Md => render::story_map_markdown(&set, epic),
        MapFormat::Mermaid => {
            // The Markdown renderer filters inline; for Mermaid the graph is
            // rebuilt over the epic's stories so edges stay consistent.
            match epic {
                Some(epic) => {
                    let filtered = StorySet::from_stories(
                        set.stories()
                            .filter(|s| s.metadata.epic.as_deref() == Some(epic))
                            .cloned(),
                    );
                    render::mermaid_graph(&filtered)
                }
                None => render::mermaid_graph(&set),
            }
        }
    };

    match output {
        Some(path) => {
            io::atomic_write(path, rendered.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(0)
}
