//! Scalar math nodes.

use serde_json::json;

use super::{GenContext, NodeCode};
use crate::schema::{NodeDefinition, NodeRegistry};
use crate::types::SocketType;

use SocketType::Float;

fn unary(node_type: &str, generate: crate::schema::GenerateFn) -> NodeDefinition {
    NodeDefinition::new(node_type, "Math", generate)
        .input("x", Float, "X")
        .output("out", Float, "Out")
}

fn binary(node_type: &str, generate: crate::schema::GenerateFn, a: f32, b: f32) -> NodeDefinition {
    NodeDefinition::new(node_type, "Math", generate)
        .input("a", Float, "A")
        .input("b", Float, "B")
        .param("a", json!(a))
        .param("b", json!(b))
        .output("out", Float, "Out")
}

pub fn register(registry: &mut NodeRegistry) {
    registry.register(binary("Add", compile_add, 0.0, 0.0));
    registry.register(binary("Subtract", compile_subtract, 0.0, 0.0));
    registry.register(binary("Multiply", compile_multiply, 1.0, 1.0));
    registry.register(binary("Divide", compile_divide, 1.0, 1.0));
    registry.register(binary("Power", compile_power, 1.0, 1.0));
    registry.register(binary("Min", compile_min, 0.0, 0.0));
    registry.register(binary("Max", compile_max, 0.0, 0.0));

    registry.register(unary("Abs", compile_abs));
    registry.register(unary("Fract", compile_fract));
    registry.register(unary("Floor", compile_floor));
    registry.register(unary("OneMinus", compile_one_minus));

    registry.register(
        NodeDefinition::new("Clamp", "Math", compile_clamp)
            .input("x", Float, "X")
            .input("min", Float, "Min")
            .input("max", Float, "Max")
            .param("min", json!(0.0))
            .param("max", json!(1.0))
            .output("out", Float, "Out"),
    );
    registry.register(
        NodeDefinition::new("Mix", "Math", compile_mix)
            .input("a", Float, "A")
            .input("b", Float, "B")
            .input("t", Float, "T")
            .param("b", json!(1.0))
            .param("t", json!(0.5))
            .output("out", Float, "Out"),
    );
    registry.register(
        NodeDefinition::new("Step", "Math", compile_step)
            .input("edge", Float, "Edge")
            .input("x", Float, "X")
            .param("edge", json!(0.5))
            .output("out", Float, "Out"),
    );
    registry.register(
        NodeDefinition::new("Smoothstep", "Math", compile_smoothstep)
            .input("edge0", Float, "Edge 0")
            .input("edge1", Float, "Edge 1")
            .input("x", Float, "X")
            .param("edge0", json!(0.0))
            .param("edge1", json!(1.0))
            .output("out", Float, "Out"),
    );
    registry.register(
        NodeDefinition::new("Remap", "Math", compile_remap)
            .input("x", Float, "X")
            .input("inMin", Float, "In Min")
            .input("inMax", Float, "In Max")
            .input("outMin", Float, "Out Min")
            .input("outMax", Float, "Out Max")
            .param("inMin", json!(-1.0))
            .param("inMax", json!(1.0))
            .param("outMin", json!(0.0))
            .param("outMax", json!(1.0))
            .output("out", Float, "Out"),
    );
}

fn emit_binary(ctx: &GenContext<'_>, f: impl Fn(&str, &str) -> String) -> NodeCode {
    let a = ctx.input("a", Float);
    let b = ctx.input("b", Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", Float, f(&a, &b));
    code
}

fn emit_unary(ctx: &GenContext<'_>, f: impl Fn(&str) -> String) -> NodeCode {
    let x = ctx.input("x", Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", Float, f(&x));
    code
}

fn compile_add(ctx: &GenContext<'_>) -> NodeCode {
    emit_binary(ctx, |a, b| format!("{a} + {b}"))
}

fn compile_subtract(ctx: &GenContext<'_>) -> NodeCode {
    emit_binary(ctx, |a, b| format!("{a} - {b}"))
}

fn compile_multiply(ctx: &GenContext<'_>) -> NodeCode {
    emit_binary(ctx, |a, b| format!("{a} * {b}"))
}

/// Division by zero yields zero instead of inf/NaN.
fn compile_divide(ctx: &GenContext<'_>) -> NodeCode {
    emit_binary(ctx, |a, b| {
        format!("(abs({b}) > 1e-6 ? {a} / {b} : 0.0)")
    })
}

fn compile_power(ctx: &GenContext<'_>) -> NodeCode {
    // pow() is undefined for negative bases.
    emit_binary(ctx, |a, b| format!("pow(abs({a}), {b})"))
}

fn compile_min(ctx: &GenContext<'_>) -> NodeCode {
    emit_binary(ctx, |a, b| format!("min({a}, {b})"))
}

fn compile_max(ctx: &GenContext<'_>) -> NodeCode {
    emit_binary(ctx, |a, b| format!("max({a}, {b})"))
}

fn compile_abs(ctx: &GenContext<'_>) -> NodeCode {
    emit_unary(ctx, |x| format!("abs({x})"))
}

fn compile_fract(ctx: &GenContext<'_>) -> NodeCode {
    emit_unary(ctx, |x| format!("fract({x})"))
}

fn compile_floor(ctx: &GenContext<'_>) -> NodeCode {
    emit_unary(ctx, |x| format!("floor({x})"))
}

fn compile_one_minus(ctx: &GenContext<'_>) -> NodeCode {
    emit_unary(ctx, |x| format!("1.0 - {x}"))
}

fn compile_clamp(ctx: &GenContext<'_>) -> NodeCode {
    let x = ctx.input("x", Float);
    let lo = ctx.input("min", Float);
    let hi = ctx.input("max", Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", Float, format!("clamp({x}, {lo}, {hi})"));
    code
}

fn compile_mix(ctx: &GenContext<'_>) -> NodeCode {
    let a = ctx.input("a", Float);
    let b = ctx.input("b", Float);
    let t = ctx.input("t", Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", Float, format!("mix({a}, {b}, {t})"));
    code
}

fn compile_step(ctx: &GenContext<'_>) -> NodeCode {
    let edge = ctx.input("edge", Float);
    let x = ctx.input("x", Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", Float, format!("step({edge}, {x})"));
    code
}

fn compile_smoothstep(ctx: &GenContext<'_>) -> NodeCode {
    let e0 = ctx.input("edge0", Float);
    let e1 = ctx.input("edge1", Float);
    let x = ctx.input("x", Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", Float, format!("smoothstep({e0}, {e1}, {x})"));
    code
}

fn compile_remap(ctx: &GenContext<'_>) -> NodeCode {
    let x = ctx.input("x", Float);
    let in_min = ctx.input("inMin", Float);
    let in_max = ctx.input("inMax", Float);
    let out_min = ctx.input("outMin", Float);
    let out_max = ctx.input("outMax", Float);
    let mut code = NodeCode::new();
    code.declare(
        ctx,
        "out",
        Float,
        format!(
            "{out_min} + ({x} - {in_min}) / max({in_max} - {in_min}, 1e-6) * ({out_max} - {out_min})"
        ),
    );
    code
}
