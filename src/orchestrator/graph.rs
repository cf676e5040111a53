// src/orchestrator/graph.rs

use std::collections::BTreeSet;
use std::fmt;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use crate::cli::Command;
use crate::errors::{PipelineError, Result};

/// One unit of orchestrated work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Clean,
    EnsureEntry,
    Compile,
    Watch,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Clean => "clean",
            Step::EnsureEntry => "ensure-entry",
            Step::Compile => "compile",
            Step::Watch => "watch",
        };
        f.write_str(name)
    }
}

/// Ordering constraints between steps; an edge `a -> b` means `a` runs
/// before `b`.
#[derive(Debug, Clone)]
pub struct StepGraph {
    graph: DiGraphMap<Step, ()>,
}

impl StepGraph {
    /// `Clean -> EnsureEntry -> Compile -> Watch`.
    pub fn standard() -> Self {
        let mut graph = DiGraphMap::new();
        graph.add_edge(Step::Clean, Step::EnsureEntry, ());
        graph.add_edge(Step::EnsureEntry, Step::Compile, ());
        graph.add_edge(Step::Compile, Step::Watch, ());
        Self { graph }
    }

    /// Every step that must run before `step`, transitively.
    pub fn ancestors(&self, step: Step) -> BTreeSet<Step> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![step];
        while let Some(current) = stack.pop() {
            for dep in self.graph.neighbors_directed(current, Direction::Incoming) {
                if seen.insert(dep) {
                    stack.push(dep);
                }
            }
        }
        seen
    }

    /// Ordered steps for `command`.
    ///
    /// - `build`: `Compile` and everything before it.
    /// - `watch`: `Watch` alone.
    /// - `default`: `Watch` and everything before it.
    pub fn plan(&self, command: Command) -> Result<Vec<Step>> {
        let selected = match command {
            Command::Build => self.with_ancestors(Step::Compile),
            Command::Watch => BTreeSet::from([Step::Watch]),
            Command::Default => self.with_ancestors(Step::Watch),
        };

        let order = toposort(&self.graph, None).map_err(|cycle| {
            PipelineError::Config(format!(
                "step graph has a cycle involving {}",
                cycle.node_id()
            ))
        })?;

        Ok(order.into_iter().filter(|s| selected.contains(s)).collect())
    }

    fn with_ancestors(&self, step: Step) -> BTreeSet<Step> {
        let mut set = self.ancestors(step);
        set.insert(step);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_plan_stops_at_compile() {
        let plan = StepGraph::standard().plan(Command::Build).unwrap();
        assert_eq!(plan, vec![Step::Clean, Step::EnsureEntry, Step::Compile]);
    }

    #[test]
    fn watch_plan_is_watch_only() {
        let plan = StepGraph::standard().plan(Command::Watch).unwrap();
        assert_eq!(plan, vec![Step::Watch]);
    }

    #[test]
    fn default_plan_builds_then_watches() {
        let plan = StepGraph::standard().plan(Command::Default).unwrap();
        assert_eq!(
            plan,
            vec![Step::Clean, Step::EnsureEntry, Step::Compile, Step::Watch]
        );
    }

    #[test]
    fn ancestors_are_transitive() {
        let g = StepGraph::standard();
        assert_eq!(
            g.ancestors(Step::Compile),
            BTreeSet::from([Step::Clean, Step::EnsureEntry])
        );
        assert!(g.ancestors(Step::Clean).is_empty());
    }

    #[test]
    fn cycle_is_reported() {
        let mut g = StepGraph::standard();
        g.graph.add_edge(Step::Watch, Step::Clean, ());
        let err = g.plan(Command::Build).unwrap_err();
        assert!(matches!(err, PipelineError::Config(msg) if msg.contains("cycle")));
    }
}
