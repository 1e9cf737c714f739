//! Static unrolling of Loop nodes.
//!
//! Each iteration compiles the step chain again under the prefix
//! `<loop>_i<k>_<step>`, so every iteration declares its own variables. A step
//! listed twice gets a numeric suffix on its second instance. The
//! carry replaces one unconnected input per step and is taken from the
//! step's first output of the carry type.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::codegen::{Codegen, invoke, output_keys, push_diagnostics};
use crate::dsl::Node;
use crate::error::{CompileError, Diagnostic};
use crate::node_compiler::loop_node::{self, CARRY_INPUT, RESULT_OUTPUT};
use crate::node_compiler::{GenContext, NodeCode};
use crate::schema::{NodeDefinition, NodeKind, effective_inputs};
use crate::types::{SocketType, TypedExpr, is_compatible};

/// Expand `node` into straight-line code.
///
/// `prefix` names the loop's own variables; `resolved` holds its wired inputs.
/// Steps that are themselves loops are expanded recursively; the scheduler has
/// already rejected loops that list themselves.
pub fn expand_loop<'a>(
    cg: &mut Codegen<'a>,
    node: &'a Node,
    def: &'a NodeDefinition,
    prefix: &str,
    resolved: HashMap<String, TypedExpr>,
) -> Result<NodeCode, CompileError> {
    let registry = cg.registry;
    let ty = loop_node::carry_type(node);
    let steps = loop_node::steps(node);
    let requested = loop_node::iterations(node);
    let iterations = requested.min(cg.config.max_loop_iterations);
    if iterations < requested {
        debug!(loop_id = %node.id, requested, iterations, "clamped loop iterations");
    }
    let ctx = GenContext::new(node, def, prefix, resolved);

    let missing: Vec<&String> = steps
        .iter()
        .filter(|id| !cg.index.contains_key(id.as_str()))
        .collect();
    if !missing.is_empty() {
        let mut code = NodeCode::new();
        for id in missing {
            warn!(loop_id = %node.id, step_id = %id, "loop step no longer exists; result falls back to zero");
            code.diagnostics.push(Diagnostic::MissingLoopStep {
                loop_node_id: node.id.clone(),
                missing_step_id: id.clone(),
            });
        }
        code.declare(&ctx, RESULT_OUTPUT, ty, ty.zero_literal());
        return Ok(code);
    }

    if steps.is_empty() || iterations == 0 {
        return Ok(invoke(def, &ctx));
    }

    let mut code = NodeCode::new();
    let mut carry = ctx.input_typed(CARRY_INPUT, ty);
    for k in 0..iterations {
        for step_id in &steps {
            let Some(&step) = cg.index.get(step_id.as_str()) else {
                continue;
            };
            let Some(step_def) = registry.lookup(&step.node_type) else {
                if k == 0 {
                    warn!(loop_id = %node.id, step_id = %step.id, node_type = %step.node_type, "unknown loop step type; skipping step");
                }
                push_diagnostics(
                    &mut code.diagnostics,
                    vec![Diagnostic::UnknownNodeType {
                        node_id: step.id.clone(),
                        node_type: step.node_type.clone(),
                    }],
                );
                continue;
            };

            let step_prefix = cg
                .names
                .claim_prefix(&format!("{prefix}_i{k}_{step_id}"), &output_keys(step, step_def));
            let mut inputs = cg.resolve_inputs(step, step_def)?;
            if let Some(key) = carry_input(step, step_def, &inputs, ty) {
                inputs.insert(key, carry.clone());
            }
            let step_code = if step_def.kind == NodeKind::Loop {
                expand_loop(cg, step, step_def, &step_prefix, inputs)?
            } else {
                let symbol = cg.names.symbol(&step.id);
                let step_ctx = GenContext::new(step, step_def, step_prefix, inputs).with_symbol(symbol);
                invoke(step_def, &step_ctx)
            };
            cg.names.record(&step_code);

            if let Some((_, out)) = step_code.outputs.iter().find(|(_, v)| v.ty == ty) {
                carry = out.clone();
            }
            if !step_code.code.is_empty() {
                code.line(&step_code.code);
            }
            code.helpers.extend(step_code.helpers);
            push_diagnostics(&mut code.diagnostics, step_code.diagnostics);
        }
    }
    code.declare(&ctx, RESULT_OUTPUT, ty, &carry.expr);
    Ok(code)
}

/// The step input the carry is fed into: the first unconnected input of the
/// carry type, else the first unconnected one the carry can coerce to.
fn carry_input(
    step: &Node,
    def: &NodeDefinition,
    connected: &HashMap<String, TypedExpr>,
    carry: SocketType,
) -> Option<String> {
    let free: Vec<_> = effective_inputs(step, def)
        .into_iter()
        .filter(|s| !connected.contains_key(s.key))
        .collect();
    free.iter()
        .find(|s| s.ty == carry)
        .or_else(|| free.iter().find(|s| is_compatible(carry, s.ty)))
        .map(|s| s.key.to_string())
}
