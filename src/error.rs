//! Compile errors and per-node diagnostics.

use std::fmt;

use thiserror::Error;

use crate::types::SocketType;

/// Errors that make the whole compile meaningless. No shader is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("graph error: cycle detected through nodes [{}]", .node_ids.join(", "))]
    CycleDetected { node_ids: Vec<String> },

    #[error("graph error: no terminal output (the graph has no reachable Output node)")]
    NoTerminalOutput,

    #[error("graph error: no terminal output (preview target '{node_id}' does not exist)")]
    PreviewTargetMissing { node_id: String },

    /// The editor is expected to reject these connections; seeing one here is a bug upstream.
    #[error(
        "internal error: {from_node}.{from_output} ({from_ty:?}) cannot feed {to_node}.{to_input} ({to_ty:?})"
    )]
    IncompatibleConnection {
        from_node: String,
        from_output: String,
        from_ty: SocketType,
        to_node: String,
        to_input: String,
        to_ty: SocketType,
    },
}

impl CompileError {
    /// Whether this is a "nothing to show" error rather than a broken graph.
    pub fn is_missing_terminal(&self) -> bool {
        matches!(
            self,
            CompileError::NoTerminalOutput | CompileError::PreviewTargetMissing { .. }
        )
    }
}

/// A problem local to one node. The compile continues and the node degrades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A Loop lists a step id that is not in the graph; its result falls back to zero.
    MissingLoopStep {
        loop_node_id: String,
        missing_step_id: String,
    },
    /// A node's type is not registered; the node is skipped.
    UnknownNodeType { node_id: String, node_type: String },
    /// An Expr node's expression did not parse; its output falls back to zero.
    InvalidExpression { node_id: String, message: String },
}

impl Diagnostic {
    pub fn node_id(&self) -> &str {
        match self {
            Diagnostic::MissingLoopStep { loop_node_id, .. } => loop_node_id,
            Diagnostic::UnknownNodeType { node_id, .. } => node_id,
            Diagnostic::InvalidExpression { node_id, .. } => node_id,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingLoopStep {
                loop_node_id,
                missing_step_id,
            } => write!(
                f,
                "loop {loop_node_id}: step '{missing_step_id}' no longer exists"
            ),
            Diagnostic::UnknownNodeType { node_id, node_type } => {
                write!(f, "node {node_id}: unknown node type '{node_type}'")
            }
            Diagnostic::InvalidExpression { node_id, message } => {
                write!(f, "node {node_id}: invalid expression: {message}")
            }
        }
    }
}
