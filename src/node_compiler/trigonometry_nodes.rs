//! Compilers for trigonometry nodes (Sin, Cos, Atan2).

use serde_json::json;

use super::{GenContext, NodeCode};
use crate::schema::{GenerateFn, NodeDefinition, NodeRegistry};
use crate::types::SocketType;

fn wave(node_type: &str, generate: GenerateFn) -> NodeDefinition {
    NodeDefinition::new(node_type, "Trigonometry", generate)
        .input("x", SocketType::Float, "X")
        .input("freq", SocketType::Float, "Frequency")
        .input("phase", SocketType::Float, "Phase")
        .param("freq", json!(1.0))
        .param("phase", json!(0.0))
        .output("out", SocketType::Float, "Out")
}

pub fn register(registry: &mut NodeRegistry) {
    registry.register(wave("Sin", compile_sin));
    registry.register(wave("Cos", compile_cos));
    registry.register(
        NodeDefinition::new("Atan2", "Trigonometry", compile_atan2)
            .input("y", SocketType::Float, "Y")
            .input("x", SocketType::Float, "X")
            .param("x", json!(1.0))
            .output("out", SocketType::Float, "Angle"),
    );
}

fn emit_wave(ctx: &GenContext<'_>, func: &str) -> NodeCode {
    let x = ctx.input("x", SocketType::Float);
    let freq = ctx.input("freq", SocketType::Float);
    let phase = ctx.param_f32("phase", 0.0);
    let arg = if ctx.connected("phase").is_some() || phase != 0.0 {
        format!("{x} * {freq} + {}", ctx.input("phase", SocketType::Float))
    } else {
        format!("{x} * {freq}")
    };
    let mut code = NodeCode::new();
    code.declare(ctx, "out", SocketType::Float, format!("{func}({arg})"));
    code
}

/// Compile a Sin node: `sin(x * freq + phase)`.
fn compile_sin(ctx: &GenContext<'_>) -> NodeCode {
    emit_wave(ctx, "sin")
}

/// Compile a Cos node: `cos(x * freq + phase)`.
fn compile_cos(ctx: &GenContext<'_>) -> NodeCode {
    emit_wave(ctx, "cos")
}

fn compile_atan2(ctx: &GenContext<'_>) -> NodeCode {
    let y = ctx.input("y", SocketType::Float);
    let x = ctx.input("x", SocketType::Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", SocketType::Float, format!("atan({y}, {x})"));
    code
}
