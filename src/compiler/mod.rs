//! Graph-to-GLSL compilation: schedule, generate, assemble.

pub mod assembler;
pub mod codegen;
pub mod loop_expand;

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CompilerConfig;
use crate::dsl::ShaderGraph;
use crate::error::{CompileError, Diagnostic};
use crate::graph;
use crate::schema::{NodeKind, NodeRegistry};

use codegen::{Codegen, push_diagnostics};

/// What the fragment shader should show.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompileTarget {
    /// The graph's Output (or OutputRgba) node.
    FullGraph,
    /// One node in isolation, whether or not it reaches an Output.
    PreviewNode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledShader {
    pub fragment_source: String,
    /// Node id -> output key -> generated variable, for showing live expressions.
    pub variables: BTreeMap<String, BTreeMap<String, String>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compile `graph` for `target`.
///
/// Pure: the graph is only read, and the same snapshot always yields the
/// same source.
pub fn compile(
    graph: &ShaderGraph,
    registry: &NodeRegistry,
    config: &CompilerConfig,
    target: &CompileTarget,
) -> Result<CompiledShader, CompileError> {
    let target_id = match target {
        CompileTarget::FullGraph => output_node_id(graph, registry).ok_or(CompileError::NoTerminalOutput)?,
        CompileTarget::PreviewNode(id) => id.as_str(),
    };
    let missing_terminal = || match target {
        CompileTarget::FullGraph => CompileError::NoTerminalOutput,
        CompileTarget::PreviewNode(id) => CompileError::PreviewTargetMissing { node_id: id.clone() },
    };

    let schedule = graph::schedule(graph, registry, target_id)?;
    let target_kind = graph
        .node(target_id)
        .and_then(|n| registry.lookup(&n.node_type))
        .map(|def| def.kind)
        .ok_or_else(missing_terminal)?;

    let generated = Codegen::new(graph, registry, config).run(&schedule.order)?;
    let terminal = generated
        .outputs
        .get(target_id)
        .and_then(|outs| assembler::terminal_write(target_kind, outs, &config.prologue.frag_color))
        .ok_or_else(missing_terminal)?;

    let fragment_source = assembler::assemble(
        &config.prologue,
        &generated.helpers,
        &generated.statements,
        &terminal,
    );

    let variables: BTreeMap<String, BTreeMap<String, String>> = generated
        .outputs
        .iter()
        .map(|(id, outs)| {
            let vars: BTreeMap<String, String> = outs.iter().map(|(k, v)| (k.clone(), v.expr.clone())).collect();
            (id.clone(), vars)
        })
        .collect();

    let mut diagnostics = schedule.diagnostics;
    push_diagnostics(&mut diagnostics, generated.diagnostics);

    debug!(
        target_node = target_id,
        nodes = schedule.order.len(),
        helpers = generated.helpers.len(),
        bytes = fragment_source.len(),
        "compiled shader"
    );
    Ok(CompiledShader {
        fragment_source,
        variables,
        diagnostics,
    })
}

/// The first Output or OutputRgba node in graph order.
pub fn output_node_id<'a>(graph: &'a ShaderGraph, registry: &NodeRegistry) -> Option<&'a str> {
    graph
        .nodes
        .iter()
        .find(|n| {
            registry
                .lookup(&n.node_type)
                .is_some_and(|def| matches!(def.kind, NodeKind::Output { .. }))
        })
        .map(|n| n.id.as_str())
}

struct Memo {
    graph: ShaderGraph,
    target: CompileTarget,
    shader: CompiledShader,
}

/// A registry and config bundled with a memo of the last successful compile.
///
/// Editors recompile on every change, and many changes (moving a node) leave
/// the compile input untouched.
pub struct Compiler {
    registry: NodeRegistry,
    config: CompilerConfig,
    memo: Mutex<Option<Memo>>,
}

impl Compiler {
    pub fn new(registry: NodeRegistry, config: CompilerConfig) -> Self {
        Self {
            registry,
            config,
            memo: Mutex::new(None),
        }
    }

    /// Built-in node types with the default config.
    pub fn with_builtins() -> Self {
        Self::new(NodeRegistry::builtin(), CompilerConfig::default())
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn compile(
        &self,
        graph: &ShaderGraph,
        target: &CompileTarget,
    ) -> Result<CompiledShader, CompileError> {
        if !self.config.memoize {
            return compile(graph, &self.registry, &self.config, target);
        }

        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(m) = memo.as_ref() {
            if m.target == *target && m.graph == *graph {
                debug!("memo hit");
                return Ok(m.shader.clone());
            }
        }
        let shader = compile(graph, &self.registry, &self.config, target)?;
        *memo = Some(Memo {
            graph: graph.clone(),
            target: target.clone(),
            shader: shader.clone(),
        });
        Ok(shader)
    }

    pub fn clear_memo(&self) {
        *self.memo.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
