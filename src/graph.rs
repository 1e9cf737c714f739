//! Scheduling: which nodes a compile needs, and in what order.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::dsl::{Node, ShaderGraph};
use crate::error::{CompileError, Diagnostic};
use crate::node_compiler::loop_node;
use crate::schema::{NodeDefinition, NodeKind, NodeRegistry, effective_inputs};

/// Evaluation order for one compile target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    /// Reachable nodes, every node after the nodes feeding it. The target is last.
    pub order: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

struct Frame<'a> {
    id: &'a str,
    deps: Vec<&'a str>,
    next: usize,
}

struct Scheduler<'a> {
    index: HashMap<&'a str, &'a Node>,
    registry: &'a NodeRegistry,
    diagnostics: Vec<Diagnostic>,
    reported: HashSet<&'a str>,
}

/// Order the nodes `target` depends on.
///
/// Walks connections backwards from the target with an iterative DFS and
/// emits nodes in post-order. A node met again while still on the DFS path
/// is a cycle. Unknown node types are left out and reported; dangling
/// connections are ignored.
pub fn schedule(
    graph: &ShaderGraph,
    registry: &NodeRegistry,
    target: &str,
) -> Result<Schedule, CompileError> {
    let mut scheduler = Scheduler {
        index: graph.nodes_by_id(),
        registry,
        diagnostics: Vec::new(),
        reported: HashSet::new(),
    };
    let Some((&root_id, &root)) = scheduler.index.get_key_value(target) else {
        return Err(CompileError::PreviewTargetMissing {
            node_id: target.to_string(),
        });
    };
    if !scheduler.known(root) {
        return Ok(Schedule {
            order: Vec::new(),
            diagnostics: scheduler.diagnostics,
        });
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let root_deps = scheduler.dependencies(root);
    let mut stack = vec![Frame {
        id: root_id,
        deps: root_deps,
        next: 0,
    }];
    marks.insert(root_id, Mark::Visiting);

    while let Some(frame) = stack.last_mut() {
        if frame.next == frame.deps.len() {
            let id = frame.id;
            stack.pop();
            marks.insert(id, Mark::Done);
            order.push(id.to_string());
            continue;
        }
        let dep = frame.deps[frame.next];
        frame.next += 1;

        match marks.get(dep) {
            Some(Mark::Done) => {}
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|f| f.id == dep).unwrap_or(0);
                let node_ids: Vec<String> = stack[start..].iter().map(|f| f.id.to_string()).collect();
                warn!(?node_ids, "cycle detected");
                return Err(CompileError::CycleDetected { node_ids });
            }
            None => {
                let Some(&node) = scheduler.index.get(dep) else {
                    continue;
                };
                marks.insert(dep, Mark::Visiting);
                let deps = scheduler.dependencies(node);
                stack.push(Frame { id: dep, deps, next: 0 });
            }
        }
    }

    debug!(target_node = target, nodes = order.len(), "scheduled");
    Ok(Schedule {
        order,
        diagnostics: scheduler.diagnostics,
    })
}

impl<'a> Scheduler<'a> {
    fn known(&mut self, node: &'a Node) -> bool {
        if self.registry.contains(&node.node_type) {
            return true;
        }
        if self.reported.insert(node.id.as_str()) {
            warn!(node_id = %node.id, node_type = %node.node_type, "unknown node type; skipping node");
            self.diagnostics.push(Diagnostic::UnknownNodeType {
                node_id: node.id.clone(),
                node_type: node.node_type.clone(),
            });
        }
        false
    }

    /// Ids of the nodes whose outputs `node` reads, in input order, without repeats.
    fn dependencies(&mut self, node: &'a Node) -> Vec<&'a str> {
        let registry = self.registry;
        let Some(def) = registry.lookup(&node.node_type) else {
            return Vec::new();
        };
        let mut deps = Vec::new();
        self.push_input_sources(node, def, &mut deps);
        if def.kind == NodeKind::Loop {
            let mut visited = HashSet::from([node.id.as_str()]);
            self.push_step_sources(node, &mut visited, &mut deps);
        }
        let mut seen = HashSet::new();
        deps.retain(|id| seen.insert(*id));
        deps
    }

    fn push_input_sources(&mut self, node: &'a Node, def: &'a NodeDefinition, deps: &mut Vec<&'a str>) {
        for input in effective_inputs(node, def) {
            let Some(conn) = input.connection else {
                continue;
            };
            let Some((&id, &source)) = self.index.get_key_value(conn.node_id.as_str()) else {
                continue;
            };
            if self.known(source) {
                deps.push(id);
            }
        }
    }

    /// A loop also reads whatever its steps read. Nested loops contribute
    /// their own steps; meeting a loop twice on the way down makes it depend
    /// on itself, which the DFS then reports as a cycle.
    fn push_step_sources(
        &mut self,
        loop_node: &'a Node,
        visited: &mut HashSet<&'a str>,
        deps: &mut Vec<&'a str>,
    ) {
        let registry = self.registry;
        for step_id in loop_node::steps(loop_node) {
            let Some((&id, &step)) = self.index.get_key_value(step_id.as_str()) else {
                continue;
            };
            let Some(def) = registry.lookup(&step.node_type) else {
                continue;
            };
            self.push_input_sources(step, def, deps);
            if def.kind == NodeKind::Loop {
                if visited.insert(id) {
                    self.push_step_sources(step, visited, deps);
                } else {
                    deps.push(id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::node_compiler::test_utils::{test_connection, test_node};

    fn chain() -> (NodeRegistry, ShaderGraph) {
        let registry = NodeRegistry::builtin();
        let mut graph = ShaderGraph::new(vec![
            test_node(&registry, "out", "Output"),
            test_node(&registry, "sin1", "Sin"),
            test_node(&registry, "uv1", "UV"),
        ]);
        test_connection(&mut graph, "uv1", "u", "sin1", "x");
        test_connection(&mut graph, "sin1", "out", "out", "color");
        (registry, graph)
    }

    #[test]
    fn orders_upstream_first() {
        let (registry, graph) = chain();
        let s = schedule(&graph, &registry, "out").unwrap();
        assert_eq!(s.order, vec!["uv1", "sin1", "out"]);
        assert!(s.diagnostics.is_empty());
    }

    #[test]
    fn unreachable_nodes_are_excluded() {
        let (registry, mut graph) = chain();
        graph.nodes.push(test_node(&registry, "lonely", "Noise"));
        let s = schedule(&graph, &registry, "out").unwrap();
        assert!(!s.order.contains(&"lonely".to_string()));

        let s = schedule(&graph, &registry, "sin1").unwrap();
        assert_eq!(s.order, vec!["uv1", "sin1"]);
    }

    #[test]
    fn fan_out_is_scheduled_once() {
        let registry = NodeRegistry::builtin();
        let mut graph = ShaderGraph::new(vec![
            test_node(&registry, "t", "Time"),
            test_node(&registry, "add", "Add"),
        ]);
        test_connection(&mut graph, "t", "time", "add", "a");
        test_connection(&mut graph, "t", "time", "add", "b");
        let s = schedule(&graph, &registry, "add").unwrap();
        assert_eq!(s.order, vec!["t", "add"]);
    }

    #[test]
    fn cycles_are_rejected_with_their_nodes() {
        let registry = NodeRegistry::builtin();
        let mut graph = ShaderGraph::new(vec![
            test_node(&registry, "out", "Output"),
            test_node(&registry, "a", "Sin"),
            test_node(&registry, "b", "Cos"),
        ]);
        test_connection(&mut graph, "a", "out", "out", "color");
        test_connection(&mut graph, "b", "out", "a", "x");
        test_connection(&mut graph, "a", "out", "b", "x");
        let err = schedule(&graph, &registry, "out").unwrap_err();
        assert_eq!(
            err,
            CompileError::CycleDetected {
                node_ids: vec!["a".into(), "b".into()]
            }
        );
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let registry = NodeRegistry::builtin();
        let mut graph = ShaderGraph::new(vec![test_node(&registry, "a", "Add")]);
        test_connection(&mut graph, "a", "out", "a", "b");
        let err = schedule(&graph, &registry, "a").unwrap_err();
        assert_eq!(err, CompileError::CycleDetected { node_ids: vec!["a".into()] });
    }

    #[test]
    fn unknown_types_are_skipped_and_reported() {
        let (registry, mut graph) = chain();
        graph.nodes.push(Node::new("ghost", "RetiredNode"));
        test_connection(&mut graph, "ghost", "out", "sin1", "phase");
        let s = schedule(&graph, &registry, "out").unwrap();
        assert_eq!(s.order, vec!["uv1", "sin1", "out"]);
        assert_eq!(
            s.diagnostics,
            vec![Diagnostic::UnknownNodeType {
                node_id: "ghost".into(),
                node_type: "RetiredNode".into()
            }]
        );
    }

    #[test]
    fn dangling_connections_are_ignored() {
        let (registry, mut graph) = chain();
        test_connection(&mut graph, "deleted", "out", "sin1", "freq");
        let s = schedule(&graph, &registry, "out").unwrap();
        assert_eq!(s.order, vec!["uv1", "sin1", "out"]);
    }

    #[test]
    fn missing_target_is_reported() {
        let (registry, graph) = chain();
        assert!(matches!(
            schedule(&graph, &registry, "nope"),
            Err(CompileError::PreviewTargetMissing { .. })
        ));
    }

    #[test]
    fn loops_depend_on_what_their_steps_read() {
        let registry = NodeRegistry::builtin();
        let mut graph = ShaderGraph::new(vec![
            test_node(&registry, "loop1", "Loop").with_param("steps", json!(["s1"])),
            test_node(&registry, "s1", "Add"),
            test_node(&registry, "t", "Time"),
        ]);
        test_connection(&mut graph, "t", "time", "s1", "b");
        let s = schedule(&graph, &registry, "loop1").unwrap();
        assert_eq!(s.order, vec!["t", "loop1"]);
    }

    #[test]
    fn step_reading_its_own_loop_is_a_cycle() {
        let registry = NodeRegistry::builtin();
        let mut graph = ShaderGraph::new(vec![
            test_node(&registry, "loop1", "Loop").with_param("steps", json!(["s1"])),
            test_node(&registry, "s1", "Add"),
        ]);
        test_connection(&mut graph, "loop1", "result", "s1", "b");
        assert!(matches!(
            schedule(&graph, &registry, "loop1"),
            Err(CompileError::CycleDetected { .. })
        ));
    }

    #[test]
    fn loops_listing_each_other_are_a_cycle() {
        let registry = NodeRegistry::builtin();
        let graph = ShaderGraph::new(vec![
            test_node(&registry, "l1", "Loop").with_param("steps", json!(["l2"])),
            test_node(&registry, "l2", "Loop").with_param("steps", json!(["l1"])),
        ]);
        assert_eq!(
            schedule(&graph, &registry, "l1").unwrap_err(),
            CompileError::CycleDetected { node_ids: vec!["l1".into()] }
        );
    }
}
