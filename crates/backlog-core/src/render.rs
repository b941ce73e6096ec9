use crate::store::StorySet;
use crate::story::Story;
use crate::types::Status;
use std::collections::BTreeMap;
use std::fmt::Write as _;

// ---------------------------------------------------------------------------
// Status presentation
// ---------------------------------------------------------------------------

/// Cosmetic icon per status. Pure presentation mapping; nothing in the
/// domain logic depends on it.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Backlog => "📋",
        Status::Ready => "🟢",
        Status::Sprint => "🏃",
        Status::InProgress => "🔨",
        Status::Review => "👀",
        Status::Done => "✅",
    }
}

// ---------------------------------------------------------------------------
// Story map (Markdown)
// ---------------------------------------------------------------------------

/// Render the story map grouped by epic, one table per epic, unassigned
/// stories last. Output is byte-deterministic: epics and stories are sorted
/// by id.
pub fn story_map_markdown(set: &StorySet, epic_filter: Option<&str>) -> String {
    let mut by_epic: BTreeMap<&str, Vec<&Story>> = BTreeMap::new();
    let mut unassigned: Vec<&Story> = Vec::new();

    for story in set.stories() {
        match story.metadata.epic.as_deref() {
            Some(epic) => by_epic.entry(epic).or_default().push(story),
            None => unassigned.push(story),
        }
    }

    let mut out = String::from("# Story Map\n");
    for (epic, stories) in &by_epic {
        if epic_filter.is_some_and(|f| f != *epic) {
            continue;
        }
        render_epic_section(&mut out, &format!("Epic: {epic}"), stories);
    }
    if epic_filter.is_none() && !unassigned.is_empty() {
        render_epic_section(&mut out, "Unassigned", &unassigned);
    }
    out
}

fn render_epic_section(out: &mut String, heading: &str, stories: &[&Story]) {
    let total: u32 = stories.iter().filter_map(|s| s.points()).sum();
    let done: u32 = stories
        .iter()
        .filter(|s| s.status().is_done())
        .filter_map(|s| s.points())
        .sum();
    let completion = if total == 0 {
        "N/A".to_string()
    } else {
        format!("{}%", (f64::from(done) * 100.0 / f64::from(total)).round())
    };

    let _ = write!(out, "\n## {heading}\n\n");
    let _ = write!(out, "Completion: {completion} ({done}/{total} points done)\n\n");
    out.push_str("| ID | Title | Status | Priority | Points |\n");
    out.push_str("|----|-------|--------|----------|--------|\n");
    for story in stories {
        let points = story
            .points()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            story.id,
            escape_table_cell(&story.title),
            story.status(),
            story.metadata.priority,
            points
        );
    }
}

fn escape_table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

// ---------------------------------------------------------------------------
// Dependency graph (Mermaid)
// ---------------------------------------------------------------------------

/// Emit a Mermaid flowchart with one node per story and one edge per
/// blocking relation (blocker --> blocked). Labels are escaped so titles
/// with quotes or angle brackets cannot break the diagram syntax.
pub fn mermaid_graph(set: &StorySet) -> String {
    let mut out = String::from("flowchart TD\n");
    for story in set.stories() {
        let _ = writeln!(
            out,
            "    {}[\"{}: {}\"]",
            story.id,
            story.id,
            escape_mermaid(&story.title)
        );
    }
    for story in set.stories() {
        let mut blockers: Vec<&String> = story
            .dependencies
            .blocked_by
            .iter()
            .filter(|b| set.contains(b))
            .collect();
        blockers.sort();
        blockers.dedup();
        for blocker in blockers {
            let _ = writeln!(out, "    {} --> {}", blocker, story.id);
        }
    }
    out
}

fn escape_mermaid(label: &str) -> String {
    label
        .replace('"', "#quot;")
        .replace('<', "#lt;")
        .replace('>', "#gt;")
        .replace('\n', " ")
}

// ---------------------------------------------------------------------------
// Per-story document
// ---------------------------------------------------------------------------

/// Render one story as a standalone Markdown document, the generated-docs
/// mirror of its YAML source.
pub fn story_doc(story: &Story) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}: {}", story.id, escape_table_cell(&story.title));
    let _ = writeln!(
        out,
        "\n{} {} | priority: {} | points: {}",
        status_icon(story.status()),
        story.status(),
        story.metadata.priority,
        story
            .points()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unestimated".to_string())
    );
    if let Some(epic) = &story.metadata.epic {
        let _ = writeln!(out, "\nEpic: {epic}");
    }

    let _ = writeln!(out, "\n## Story\n");
    let _ = writeln!(out, "As a {},", story.story.as_a);
    let _ = writeln!(out, "I want {},", story.story.i_want);
    let _ = writeln!(out, "so that {}.", story.story.so_that);

    if !story.acceptance_criteria.is_empty() {
        let _ = writeln!(out, "\n## Acceptance criteria\n");
        for (i, ac) in story.acceptance_criteria.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. Given {}, when {}, then {}.",
                i + 1,
                ac.given,
                ac.when,
                ac.then
            );
        }
    }

    if !story.dependencies.blocked_by.is_empty() || !story.dependencies.blocks.is_empty() {
        let _ = writeln!(out, "\n## Dependencies\n");
        if !story.dependencies.blocked_by.is_empty() {
            let _ = writeln!(out, "- Blocked by: {}", story.dependencies.blocked_by.join(", "));
        }
        if !story.dependencies.blocks.is_empty() {
            let _ = writeln!(out, "- Blocks: {}", story.dependencies.blocks.join(", "));
        }
    }

    if let Some(notes) = &story.technical_notes {
        let _ = writeln!(out, "\n## Technical notes\n\n{notes}");
    }

    if let Some(v) = &story.validation {
        let _ = writeln!(
            out,
            "\n## Validation\n\nINVEST score {} (checked {})",
            v.score,
            v.checked_at.format("%Y-%m-%d")
        );
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
