use crate::output::print_json;
use crate::OutputFormat;
use anyhow::Context;
use backlog_core::config::Config;
use backlog_core::invest::{self, Criterion, ValidationResult};
use backlog_core::store::StorySet;
use std::path::Path;

pub fn run(
    root: &Path,
    story_id: Option<&str>,
    strict: bool,
    save: bool,
    output: OutputFormat,
) -> anyhow::Result<i32> {
    let cfg = Config::load_or_default(root).context("failed to load config")?;
    let set = StorySet::load(root).context("failed to load stories")?;
    super::warn_load_issues(&set);

    match story_id {
        Some(id) => validate_one(root, &set, &cfg, id, strict, save, output),
        None => validate_all(root, &set, &cfg, strict, save, output),
    }
}

// ---------------------------------------------------------------------------
// single story
// ---------------------------------------------------------------------------

fn validate_one(
    root: &Path,
    set: &StorySet,
    cfg: &Config,
    id: &str,
    strict: bool,
    save: bool,
    output: OutputFormat,
) -> anyhow::Result<i32> {
    let Some(story) = set.get(id) else {
        eprintln!("error: story not found: {id}");
        return Ok(2);
    };

    let result = invest::evaluate(story, &cfg.rubric);
    let passed = result.passes(&cfg.rubric, strict);

    if save {
        let mut updated = story.clone();
        updated.validation = Some(result.to_persisted());
        updated
            .save(root)
            .with_context(|| format!("failed to save validation for {id}"))?;
        tracing::debug!("validation saved for {id}");
    }

    match output {
        OutputFormat::Json => {
            print_json(&serde_json::json!({
                "passed": passed,
                "strict": strict,
                "validation": result,
            }))?;
        }
        OutputFormat::Text => {
            println!("{}: {}", story.id, story.title);
            if strict {
                println!("score: {}/100 (strict: all criteria required)", result.score);
            } else {
                println!(
                    "score: {}/100 (pass threshold {})",
                    result.score, cfg.rubric.pass_threshold
                );
            }
            println!("criteria:");
            for &c in Criterion::all() {
                let mark = if result.criteria.get(c) { "x" } else { " " };
                println!("  [{mark}] {c}");
            }
            print_issues(&result);
            println!("{}", if passed { "PASS" } else { "FAIL" });
        }
    }

    Ok(if passed { 0 } else { 1 })
}

fn print_issues(result: &ValidationResult) {
    if result.issues.is_empty() {
        return;
    }
    println!("issues:");
    for issue in &result.issues {
        println!("  - {issue}");
    }
}

// ---------------------------------------------------------------------------
// whole set
// ---------------------------------------------------------------------------

fn validate_all(
    root: &Path,
    set: &StorySet,
    cfg: &Config,
    strict: bool,
    save: bool,
    output: OutputFormat,
) -> anyhow::Result<i32> {
    let summary = invest::evaluate_all(set, &cfg.rubric, strict);

    if save {
        for result in &summary.results {
            let Some(story) = set.get(&result.id) else {
                continue;
            };
            let mut updated = story.clone();
            updated.validation = Some(result.to_persisted());
            updated
                .save(root)
                .with_context(|| format!("failed to save validation for {}", result.id))?;
        }
    }

    match output {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text => {
            println!(
                "{} stories, {} passed ({}%)",
                summary.total, summary.passed, summary.pass_rate
            );
            if !summary.issue_frequency.is_empty() {
                println!("\nMost common issues:");
                for f in &summary.issue_frequency {
                    println!(
                        "  {:<12} {} {}",
                        f.criterion.to_string(),
                        f.count,
                        if f.count == 1 { "story" } else { "stories" }
                    );
                }
            }
            let failing: Vec<&ValidationResult> = summary
                .results
                .iter()
                .filter(|r| !r.passes(&cfg.rubric, strict))
                .collect();
            if !failing.is_empty() {
                println!("\nFailing stories:");
                for r in failing {
                    println!("  {} ({}/100)", r.id, r.score);
                    for issue in &r.issues {
                        println!("    - {issue}");
                    }
                }
            }
        }
    }

    Ok(if summary.passed == summary.total { 0 } else { 1 })
}
