//! User-authored nodes: `CustomFunction` and `Expr`.
//!
//! Both read their sockets from the instance, since the editor adds and
//! removes arguments as the user edits them.

use std::collections::HashMap;

use serde_json::json;
use tracing::warn;

use super::{GenContext, NodeCode};
use crate::error::Diagnostic;
use crate::expr;
use crate::schema::{NodeDefinition, NodeRegistry};
use crate::types::{SocketType, TypedExpr};
use crate::utils::{indent, sanitize_glsl_ident};

pub fn register(registry: &mut NodeRegistry) {
    registry.register(
        NodeDefinition::new("CustomFunction", "Custom", compile_custom_function)
            .input("a", SocketType::Float, "A")
            .input("b", SocketType::Float, "B")
            .param("body", json!("return a + b;"))
            .param("returnType", json!("float"))
            .output("out", SocketType::Float, "Out"),
    );
    registry.register(
        NodeDefinition::new("Expr", "Custom", compile_expr)
            .input("a", SocketType::Float, "A")
            .input("b", SocketType::Float, "B")
            .param("expression", json!("a"))
            .output("out", SocketType::Float, "Out"),
    );
}

/// Return type: the instance's `out` socket, else `returnType`.
fn return_type(ctx: &GenContext<'_>) -> SocketType {
    ctx.output_type("out")
        .or_else(|| ctx.param_str("returnType").and_then(SocketType::parse))
        .unwrap_or(SocketType::Float)
}

/// Helper name for the node whose codegen symbol is `symbol`.
pub fn function_name(symbol: &str) -> String {
    sanitize_glsl_ident(&format!("cf_{symbol}"))
}

fn has_return(body: &str) -> bool {
    body.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|word| word == "return")
}

fn function_body(body: &str, ret: SocketType) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("return {};", ret.zero_literal());
    }
    if has_return(body) {
        return body.to_string();
    }
    format!("return ({});", body.trim_end_matches(';').trim_end())
}

fn compile_custom_function(ctx: &GenContext<'_>) -> NodeCode {
    let ret = return_type(ctx);
    let name = function_name(ctx.symbol());

    let params: Vec<String> = ctx
        .inputs()
        .iter()
        .map(|s| format!("{} {}", s.ty.glsl(), sanitize_glsl_ident(s.key)))
        .collect();
    let body = function_body(ctx.param_str("body").unwrap_or_default(), ret);
    let helper = format!(
        "{} {name}({}) {{\n{}\n}}",
        ret.glsl(),
        params.join(", "),
        indent(&body, 1)
    );

    let args: Vec<String> = ctx
        .inputs()
        .iter()
        .map(|s| ctx.input(s.key, s.ty))
        .collect();

    let mut code = NodeCode::new();
    code.helper(helper);
    code.declare(ctx, "out", ret, format!("{name}({})", args.join(", ")));
    code
}

fn compile_expr(ctx: &GenContext<'_>) -> NodeCode {
    let ty = ctx.output_type("out").unwrap_or(SocketType::Float);
    let mut code = NodeCode::new();

    let source = ctx.param_str("expression").unwrap_or_default();
    if source.trim().is_empty() {
        code.declare(ctx, "out", ty, TypedExpr::zero(ty).expr);
        return code;
    }

    let bindings: HashMap<String, String> = ctx
        .inputs()
        .iter()
        .map(|s| (s.key.to_string(), ctx.input(s.key, s.ty)))
        .collect();
    match expr::compile_expression(source, &bindings) {
        Ok(glsl) => {
            code.declare(ctx, "out", ty, glsl);
        }
        Err(err) => {
            warn!(node_id = %ctx.node.id, %err, "invalid expression; output falls back to zero");
            code.diagnostics.push(Diagnostic::InvalidExpression {
                node_id: ctx.node.id.clone(),
                message: err.to_string(),
            });
            code.declare(ctx, "out", ty, TypedExpr::zero(ty).expr);
        }
    }
    code
}
