//! The Loop node definition.
//!
//! Loops are unrolled by `compiler::loop_expand`; the generator registered here
//! only covers the degenerate case (no steps or zero iterations), where the
//! result is the carry passed straight through.

use serde_json::{Value, json};

use super::{GenContext, NodeCode};
use crate::dsl::{self, Node};
use crate::schema::{NodeDefinition, NodeKind, NodeRegistry};
use crate::types::SocketType;

pub const CARRY_INPUT: &str = "carry";
pub const RESULT_OUTPUT: &str = "result";

pub fn register(registry: &mut NodeRegistry) {
    registry.register(
        NodeDefinition::new("Loop", "Iteration", compile_loop_identity)
            .kind(NodeKind::Loop)
            .input(CARRY_INPUT, SocketType::Float, "Carry")
            .param("steps", json!([]))
            .param("iterations", json!(4))
            .param("carryType", json!("float"))
            .output(RESULT_OUTPUT, SocketType::Float, "Result"),
    );
}

/// Type threaded through the iterations.
///
/// The instance's `carry` socket wins; `carryType` covers instances whose
/// sockets were never materialised.
pub fn carry_type(node: &Node) -> SocketType {
    node.input(CARRY_INPUT)
        .map(|s| s.ty)
        .or_else(|| {
            node.params
                .get("carryType")
                .and_then(Value::as_str)
                .and_then(SocketType::parse)
        })
        .unwrap_or(SocketType::Float)
}

/// Ordered step node ids.
pub fn steps(node: &Node) -> Vec<String> {
    node.params
        .get("steps")
        .map(dsl::parse_id_list)
        .unwrap_or_default()
}

/// Requested iteration count, before clamping to the configured maximum.
pub fn iterations(node: &Node) -> u32 {
    node.params
        .get("iterations")
        .and_then(dsl::parse_u32)
        .unwrap_or(4)
}

fn compile_loop_identity(ctx: &GenContext<'_>) -> NodeCode {
    let ty = carry_type(ctx.node);
    let carry = ctx.input(CARRY_INPUT, ty);
    let mut code = NodeCode::new();
    code.declare(ctx, RESULT_OUTPUT, ty, carry);
    code
}
