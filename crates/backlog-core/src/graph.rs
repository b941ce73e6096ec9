use crate::config::GraphConfig;
use crate::store::StorySet;
use crate::story::Story;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DanglingReference {
    pub referencing_id: String,
    pub missing_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainWarning {
    pub id: String,
    /// Number of transitive blockers in the longest chain ending here.
    pub length: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bottleneck {
    pub id: String,
    /// Stories this one directly blocks.
    pub blocks_count: usize,
}

/// Structural findings over the whole story set. Cycles and dangling
/// references are hard failures for CI use; long chains and bottlenecks
/// are warnings. Each field is independently queryable.
#[derive(Debug, Clone, Serialize)]
pub struct GraphReport {
    pub cycles: Vec<Vec<String>>,
    pub dangling: Vec<DanglingReference>,
    pub long_chains: Vec<ChainWarning>,
    pub ready: Vec<String>,
    pub bottlenecks: Vec<Bottleneck>,
}

impl GraphReport {
    pub fn has_failures(&self) -> bool {
        !self.cycles.is_empty() || !self.dangling.is_empty()
    }
}

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// Directed graph over a loaded story set with blocker → blocked edges,
/// rebuilt fresh from the records on every run.
pub struct DependencyGraph<'a> {
    set: &'a StorySet,
    /// blocker id → ids it blocks (known nodes only, sorted).
    edges: BTreeMap<&'a str, Vec<&'a str>>,
    /// blocked id → its blockers (known nodes only, sorted).
    blockers: BTreeMap<&'a str, Vec<&'a str>>,
    dangling: Vec<DanglingReference>,
}

impl<'a> DependencyGraph<'a> {
    /// Edges come from `blocked_by` (blocker → blocked). References to ids
    /// missing from the set, in either dependency list, are collected as
    /// dangling, never silently dropped.
    pub fn build(set: &'a StorySet) -> Self {
        let mut edges: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        let mut blockers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        let mut dangling: BTreeSet<(String, String)> = BTreeSet::new();

        for story in set.stories() {
            for blocker in &story.dependencies.blocked_by {
                match set.get(blocker) {
                    Some(b) => {
                        edges.entry(b.id.as_str()).or_default().push(story.id.as_str());
                        blockers
                            .entry(story.id.as_str())
                            .or_default()
                            .push(b.id.as_str());
                    }
                    None => {
                        dangling.insert((story.id.clone(), blocker.clone()));
                    }
                }
            }
            for blocked in &story.dependencies.blocks {
                if set.get(blocked).is_none() {
                    dangling.insert((story.id.clone(), blocked.clone()));
                }
            }
        }
        for targets in edges.values_mut() {
            targets.sort_unstable();
            targets.dedup();
        }
        for sources in blockers.values_mut() {
            sources.sort_unstable();
            sources.dedup();
        }

        let dangling = dangling
            .into_iter()
            .map(|(referencing_id, missing_id)| DanglingReference {
                referencing_id,
                missing_id,
            })
            .collect();

        Self {
            set,
            edges,
            blockers,
            dangling,
        }
    }

    pub fn dangling(&self) -> &[DanglingReference] {
        &self.dangling
    }

    /// Direct blockers of `id` that exist in the set.
    pub fn direct_blockers(&self, id: &str) -> &[&'a str] {
        self.blockers.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stories directly blocked by `id`.
    pub fn blocked_by_this(&self, id: &str) -> &[&'a str] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    // -----------------------------------------------------------------------
    // Cycles
    // -----------------------------------------------------------------------

    /// Every distinct directed cycle, each rotated so its smallest id comes
    /// first. Handles self-loops and disconnected components.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut found: BTreeSet<Vec<String>> = BTreeSet::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = Vec::new();
        let mut on_stack: HashSet<&str> = HashSet::new();

        for id in self.set.ids() {
            if !visited.contains(id) {
                self.dfs_cycles(id, &mut visited, &mut stack, &mut on_stack, &mut found);
            }
        }
        found.into_iter().collect()
    }

    fn dfs_cycles(
        &self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        stack: &mut Vec<&'a str>,
        on_stack: &mut HashSet<&'a str>,
        found: &mut BTreeSet<Vec<String>>,
    ) {
        visited.insert(node);
        stack.push(node);
        on_stack.insert(node);

        for &next in self.blocked_by_this(node) {
            if on_stack.contains(next) {
                // Back-edge: the cycle is the stack slice from `next` onward.
                let start = stack.iter().position(|&n| n == next).unwrap();
                found.insert(canonical_cycle(&stack[start..]));
            } else if !visited.contains(next) {
                self.dfs_cycles(next, visited, stack, on_stack, found);
            }
        }

        stack.pop();
        on_stack.remove(node);
    }

    /// Ids participating in at least one cycle.
    pub fn cycle_members(&self) -> BTreeSet<String> {
        self.cycles().into_iter().flatten().collect()
    }

    // -----------------------------------------------------------------------
    // Blocking chains
    // -----------------------------------------------------------------------

    /// Length of the longest transitive blocker chain ending at `id`.
    /// Back-edges from cycles contribute nothing; cycles are reported
    /// separately rather than inflating chain lengths.
    pub fn chain_length(&self, id: &str) -> usize {
        let mut memo = HashMap::new();
        let mut visiting = HashSet::new();
        self.chain_depth(id, &mut memo, &mut visiting)
    }

    fn chain_depth(
        &self,
        node: &str,
        memo: &mut HashMap<String, usize>,
        visiting: &mut HashSet<String>,
    ) -> usize {
        if let Some(&d) = memo.get(node) {
            return d;
        }
        if !visiting.insert(node.to_string()) {
            return 0;
        }
        let d = self
            .direct_blockers(node)
            .iter()
            .map(|&b| self.chain_depth(b, memo, visiting) + 1)
            .max()
            .unwrap_or(0);
        visiting.remove(node);
        memo.insert(node.to_string(), d);
        d
    }

    // -----------------------------------------------------------------------
    // Readiness
    // -----------------------------------------------------------------------

    /// A story is ready to start when every blocker in its `blocked_by` list
    /// has status done. Readiness follows the blockers' current status, not
    /// the structural in-degree: a satisfied edge still exists in the YAML.
    /// Dangling blockers cannot be confirmed done, so they keep a story
    /// unready. Stories already done are not "ready to start".
    pub fn is_ready(&self, story: &Story) -> bool {
        if story.status().is_done() {
            return false;
        }
        story
            .dependencies
            .blocked_by
            .iter()
            .all(|b| self.set.get(b).map(|s| s.status().is_done()).unwrap_or(false))
    }

    pub fn ready(&self) -> Vec<&'a Story> {
        self.set.stories().filter(|s| self.is_ready(s)).collect()
    }

    // -----------------------------------------------------------------------
    // Bottlenecks
    // -----------------------------------------------------------------------

    /// Stories whose direct out-degree exceeds `threshold`, highest impact
    /// first, ties broken by id.
    pub fn bottlenecks(&self, threshold: usize) -> Vec<Bottleneck> {
        let mut out: Vec<Bottleneck> = self
            .edges
            .iter()
            .filter(|(_, blocked)| blocked.len() > threshold)
            .map(|(&id, blocked)| Bottleneck {
                id: id.to_string(),
                blocks_count: blocked.len(),
            })
            .collect();
        out.sort_by(|a, b| b.blocks_count.cmp(&a.blocks_count).then(a.id.cmp(&b.id)));
        out
    }

    // -----------------------------------------------------------------------
    // Full analysis
    // -----------------------------------------------------------------------

    pub fn analyze(&self, cfg: &GraphConfig) -> GraphReport {
        let long_chains = self
            .set
            .ids()
            .map(|id| ChainWarning {
                id: id.to_string(),
                length: self.chain_length(id),
            })
            .filter(|c| c.length > cfg.max_chain_length)
            .collect();

        GraphReport {
            cycles: self.cycles(),
            dangling: self.dangling.clone(),
            long_chains,
            ready: self.ready().iter().map(|s| s.id.clone()).collect(),
            bottlenecks: self.bottlenecks(cfg.bottleneck_threshold),
        }
    }
}

/// Rotate a cycle so the lexicographically smallest id is first, keeping
/// edge order. Makes equal cycles found from different DFS roots compare
/// equal.
fn canonical_cycle(cycle: &[&str]) -> Vec<String> {
    let min_pos = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, id)| **id)
        .map(|(i, _)| i)
        .unwrap_or(0);
    cycle[min_pos..]
        .iter()
        .chain(cycle[..min_pos].iter())
        .map(|s| s.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
