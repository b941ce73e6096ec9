use crate::config::RubricConfig;
use crate::store::StorySet;
use crate::story::Story;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Criterion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Independent,
    Negotiable,
    Valuable,
    Estimable,
    Small,
    Testable,
}

impl Criterion {
    pub fn all() -> &'static [Criterion] {
        &[
            Criterion::Independent,
            Criterion::Negotiable,
            Criterion::Valuable,
            Criterion::Estimable,
            Criterion::Small,
            Criterion::Testable,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::Independent => "independent",
            Criterion::Negotiable => "negotiable",
            Criterion::Valuable => "valuable",
            Criterion::Estimable => "estimable",
            Criterion::Small => "small",
            Criterion::Testable => "testable",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CriteriaResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaResult {
    pub independent: bool,
    pub negotiable: bool,
    pub valuable: bool,
    pub estimable: bool,
    pub small: bool,
    pub testable: bool,
}

impl CriteriaResult {
    pub fn get(&self, c: Criterion) -> bool {
        match c {
            Criterion::Independent => self.independent,
            Criterion::Negotiable => self.negotiable,
            Criterion::Valuable => self.valuable,
            Criterion::Estimable => self.estimable,
            Criterion::Small => self.small,
            Criterion::Testable => self.testable,
        }
    }

    pub fn passed_count(&self) -> u32 {
        Criterion::all().iter().filter(|&&c| self.get(c)).count() as u32
    }

    pub fn all_pass(&self) -> bool {
        self.passed_count() == 6
    }
}

// ---------------------------------------------------------------------------
// Validation (persisted) / ValidationResult (ephemeral)
// ---------------------------------------------------------------------------

/// The record written under a story's `validation` key by the save path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validation {
    pub score: u32,
    pub criteria: CriteriaResult,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub id: String,
    pub criteria: CriteriaResult,
    pub score: u32,
    pub issues: Vec<String>,
}

impl ValidationResult {
    /// Non-strict: score at or above the configured threshold.
    /// Strict: all six criteria must pass.
    pub fn passes(&self, cfg: &RubricConfig, strict: bool) -> bool {
        if strict {
            self.criteria.all_pass()
        } else {
            self.score >= cfg.pass_threshold
        }
    }

    pub fn to_persisted(&self) -> Validation {
        Validation {
            score: self.score,
            criteria: self.criteria,
            checked_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Score one story against the six INVEST criteria.
///
/// Independent and Negotiable are heuristics: Independent is a structural
/// proxy (any non-empty blocked_by fails it), and Negotiable is a
/// case-insensitive phrase match against the configured deny-list.
pub fn evaluate(story: &Story, cfg: &RubricConfig) -> ValidationResult {
    let mut issues = Vec::new();

    let independent = story.dependencies.blocked_by.is_empty();
    if !independent {
        issues.push(format!(
            "dependencies.blocked_by lists {} ({}); split or resequence so the story stands alone",
            plural(story.dependencies.blocked_by.len(), "story", "stories"),
            story.dependencies.blocked_by.join(", ")
        ));
    }

    let negotiable = match prescriptive_phrase(story, cfg) {
        Some(phrase) => {
            issues.push(format!(
                "story narrative contains prescriptive language '{phrase}'; describe the need, not the implementation"
            ));
            false
        }
        None => true,
    };

    let so_that = story.story.so_that.trim();
    let valuable = so_that.len() >= cfg.min_so_that_len;
    if !valuable {
        if so_that.is_empty() {
            issues.push("story.so_that is empty; state the concrete benefit".to_string());
        } else {
            issues.push(format!(
                "story.so_that is only {} characters (minimum {}); state the concrete benefit",
                so_that.len(),
                cfg.min_so_that_len
            ));
        }
    }

    let estimable = story.points().is_some();
    if !estimable {
        issues.push(
            "metadata.story_points is not set; estimate the story before planning".to_string(),
        );
    }

    // Unestimated stories cannot be "too large"; that is Estimable's failure.
    let small = story.points().map(|p| p <= cfg.max_story_points).unwrap_or(true);
    if !small {
        issues.push(format!(
            "metadata.story_points is {} (maximum {}); split the story",
            story.points().unwrap_or(0),
            cfg.max_story_points
        ));
    }

    let testable = !story.acceptance_criteria.is_empty();
    if !testable {
        issues.push(
            "acceptance_criteria is empty; add at least one given/when/then".to_string(),
        );
    }

    let criteria = CriteriaResult {
        independent,
        negotiable,
        valuable,
        estimable,
        small,
        testable,
    };

    ValidationResult {
        id: story.id.clone(),
        criteria,
        score: score_from_passed(criteria.passed_count()),
        issues,
    }
}

/// score = round(100 × passed / 6), so score ∈ {0, 17, 33, 50, 67, 83, 100}.
fn score_from_passed(passed: u32) -> u32 {
    (f64::from(passed) * 100.0 / 6.0).round() as u32
}

fn prescriptive_phrase<'a>(story: &Story, cfg: &'a RubricConfig) -> Option<&'a str> {
    let haystack = format!(
        "{} {} {} {}",
        story.title, story.story.as_a, story.story.i_want, story.story.so_that
    )
    .to_lowercase();
    cfg.negotiable_deny_list
        .iter()
        .find(|phrase| haystack.contains(&phrase.to_lowercase()))
        .map(String::as_str)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

// ---------------------------------------------------------------------------
// Batch mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct IssueFrequency {
    pub criterion: Criterion,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub passed: usize,
    /// Percentage of stories passing, rounded to one decimal.
    pub pass_rate: f64,
    pub results: Vec<ValidationResult>,
    /// Failed criteria ranked by how many stories fail them, most common
    /// first, for prioritized remediation.
    pub issue_frequency: Vec<IssueFrequency>,
}

pub fn evaluate_all(set: &StorySet, cfg: &RubricConfig, strict: bool) -> BatchSummary {
    let results: Vec<ValidationResult> = set.stories().map(|s| evaluate(s, cfg)).collect();
    let passed = results.iter().filter(|r| r.passes(cfg, strict)).count();
    let total = results.len();
    let pass_rate = if total == 0 {
        100.0
    } else {
        (passed as f64 * 1000.0 / total as f64).round() / 10.0
    };

    let mut issue_frequency: Vec<IssueFrequency> = Criterion::all()
        .iter()
        .map(|&criterion| IssueFrequency {
            criterion,
            count: results.iter().filter(|r| !r.criteria.get(criterion)).count(),
        })
        .filter(|f| f.count > 0)
        .collect();
    issue_frequency.sort_by(|a, b| b.count.cmp(&a.count).then(a.criterion.cmp(&b.criterion)));

    BatchSummary {
        total,
        passed,
        pass_rate,
        results,
        issue_frequency,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
