use crate::output::print_json;
use crate::OutputFormat;
use anyhow::Context;
use backlog_core::config::Config;
use backlog_core::graph::{DependencyGraph, GraphReport};
use backlog_core::store::StorySet;
use backlog_core::{io, render};
use std::path::Path;

pub fn run(
    root: &Path,
    story_id: Option<&str>,
    output_diagram: Option<&Path>,
    output: OutputFormat,
) -> anyhow::Result<i32> {
    let cfg = Config::load_or_default(root).context("failed to load config")?;
    let set = StorySet::load(root).context("failed to load stories")?;
    super::warn_load_issues(&set);

    let graph = DependencyGraph::build(&set);
    let report = graph.analyze(&cfg.graph);

    if let Some(path) = output_diagram {
        io::atomic_write(path, render::mermaid_graph(&set).as_bytes())
            .with_context(|| format!("failed to write diagram to {}", path.display()))?;
        tracing::debug!("diagram written to {}", path.display());
    }

    if let Some(id) = story_id {
        let Some(story) = set.get(id) else {
            eprintln!("error: story not found: {id}");
            return Ok(2);
        };
        print_story_focus(story, &graph, id, output)?;
    } else {
        match output {
            OutputFormat::Json => print_json(&report)?,
            OutputFormat::Text => print_report(&report),
        }
    }

    // Cycles and dangling references are a hard failure signal for CI.
    Ok(if report.has_failures() { 1 } else { 0 })
}

fn print_story_focus(
    story: &backlog_core::story::Story,
    graph: &DependencyGraph,
    id: &str,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let ready = graph.is_ready(story);
    let blockers = graph.direct_blockers(id);
    let blocks = graph.blocked_by_this(id);
    let chain = graph.chain_length(id);

    if output == OutputFormat::Json {
        return print_json(&serde_json::json!({
            "id": id,
            "status": story.status(),
            "ready": ready,
            "blocked_by": blockers,
            "blocks": blocks,
            "chain_length": chain,
        }));
    }

    println!("{}: {}", story.id, story.title);
    println!("status: {}", story.status());
    println!("ready to start: {}", if ready { "yes" } else { "no" });
    println!(
        "blocked by: {}",
        if blockers.is_empty() {
            "(none)".to_string()
        } else {
            blockers.join(", ")
        }
    );
    println!(
        "blocks: {}",
        if blocks.is_empty() {
            "(none)".to_string()
        } else {
            blocks.join(", ")
        }
    );
    println!("longest blocker chain: {chain}");
    Ok(())
}

fn print_report(report: &GraphReport) {
    if report.cycles.is_empty() {
        println!("Cycles: none");
    } else {
        println!("Cycles:");
        for cycle in &report.cycles {
            println!("  {}", cycle.join(" -> "));
        }
    }

    if report.dangling.is_empty() {
        println!("Dangling references: none");
    } else {
        println!("Dangling references:");
        for d in &report.dangling {
            println!("  {} -> {} (missing)", d.referencing_id, d.missing_id);
        }
    }

    if !report.long_chains.is_empty() {
        println!("Long blocking chains:");
        for c in &report.long_chains {
            println!("  {} ({} transitive blockers)", c.id, c.length);
        }
    }

    if !report.bottlenecks.is_empty() {
        println!("Bottlenecks:");
        for b in &report.bottlenecks {
            println!("  {} blocks {} stories", b.id, b.blocks_count);
        }
    }

    if report.ready.is_empty() {
        println!("Ready to start: none");
    } else {
        println!("Ready to start: {}", report.ready.join(", "));
    }
}
