use crate::output::{print_json, print_table};
use crate::OutputFormat;
use anyhow::Context;
use backlog_core::store::StorySet;
use backlog_core::story::Story;
use backlog_core::types::Status;
use std::path::Path;
use std::str::FromStr;

pub fn run(
    root: &Path,
    status: Option<&str>,
    epic: Option<&str>,
    output: OutputFormat,
) -> anyhow::Result<i32> {
    let status = status
        .map(Status::from_str)
        .transpose()
        .context("invalid --status filter")?;

    let set = StorySet::load(root).context("failed to load stories")?;
    super::warn_load_issues(&set);

    let stories: Vec<&Story> = set
        .stories()
        .filter(|s| status.is_none_or(|wanted| s.status() == wanted))
        .filter(|s| epic.is_none_or(|e| s.metadata.epic.as_deref() == Some(e)))
        .collect();

    if output == OutputFormat::Json {
        let out: Vec<_> = stories
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.id,
                    "title": s.title,
                    "status": s.status(),
                    "priority": s.metadata.priority,
                    "points": s.points(),
                    "epic": s.metadata.epic,
                })
            })
            .collect();
        print_json(&out)?;
        return Ok(0);
    }

    if stories.is_empty() {
        println!("No stories matched.");
        return Ok(0);
    }

    let rows: Vec<Vec<String>> = stories
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.title.clone(),
                s.status().to_string(),
                s.metadata.priority.to_string(),
                s.points().map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
                s.metadata.epic.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["ID", "TITLE", "STATUS", "PRIORITY", "POINTS", "EPIC"], rows);
    Ok(0)
}
