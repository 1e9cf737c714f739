//! Source nodes: shader inputs (UV, Time, Resolution) and constants.

use serde_json::json;

use super::{GenContext, NodeCode};
use crate::schema::{NodeDefinition, NodeRegistry};
use crate::types::SocketType;

/// Varying and uniforms every prologue must declare.
pub const UV_VARYING: &str = "vUv";
pub const TIME_UNIFORM: &str = "u_time";
pub const RESOLUTION_UNIFORM: &str = "u_resolution";

pub fn register(registry: &mut NodeRegistry) {
    registry.register(
        NodeDefinition::new("UV", "Input", compile_uv)
            .output("uv", SocketType::Vec2, "UV")
            .output("u", SocketType::Float, "U")
            .output("v", SocketType::Float, "V"),
    );
    registry.register(
        NodeDefinition::new("Time", "Input", compile_time)
            .input("speed", SocketType::Float, "Speed")
            .param("speed", json!(1.0))
            .output("time", SocketType::Float, "Time"),
    );
    registry.register(
        NodeDefinition::new("Resolution", "Input", compile_resolution)
            .output("resolution", SocketType::Vec2, "Resolution"),
    );
    registry.register(
        NodeDefinition::new("Float", "Input", compile_float)
            .param("value", json!(0.0))
            .output("value", SocketType::Float, "Value"),
    );
    registry.register(
        NodeDefinition::new("Vec2", "Input", compile_vec2)
            .input("x", SocketType::Float, "X")
            .input("y", SocketType::Float, "Y")
            .output("value", SocketType::Vec2, "Vector"),
    );
    registry.register(
        NodeDefinition::new("Vec3", "Input", compile_vec3)
            .input("x", SocketType::Float, "X")
            .input("y", SocketType::Float, "Y")
            .input("z", SocketType::Float, "Z")
            .output("value", SocketType::Vec3, "Vector"),
    );
    registry.register(
        NodeDefinition::new("Color", "Input", compile_color)
            .param("color", json!([1.0, 1.0, 1.0]))
            .output("color", SocketType::Vec3, "Color"),
    );
}

fn compile_uv(ctx: &GenContext<'_>) -> NodeCode {
    let mut code = NodeCode::new();
    let uv = code.declare(ctx, "uv", SocketType::Vec2, UV_VARYING);
    code.declare(ctx, "u", SocketType::Float, format!("{uv}.x"));
    code.declare(ctx, "v", SocketType::Float, format!("{uv}.y"));
    code
}

fn compile_time(ctx: &GenContext<'_>) -> NodeCode {
    let speed = ctx.input("speed", SocketType::Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "time", SocketType::Float, format!("{TIME_UNIFORM} * {speed}"));
    code
}

fn compile_resolution(ctx: &GenContext<'_>) -> NodeCode {
    let mut code = NodeCode::new();
    code.declare(ctx, "resolution", SocketType::Vec2, RESOLUTION_UNIFORM);
    code
}

fn compile_float(ctx: &GenContext<'_>) -> NodeCode {
    let value = ctx.input("value", SocketType::Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "value", SocketType::Float, value);
    code
}

fn compile_vec2(ctx: &GenContext<'_>) -> NodeCode {
    let x = ctx.input("x", SocketType::Float);
    let y = ctx.input("y", SocketType::Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "value", SocketType::Vec2, format!("vec2({x}, {y})"));
    code
}

fn compile_vec3(ctx: &GenContext<'_>) -> NodeCode {
    let x = ctx.input("x", SocketType::Float);
    let y = ctx.input("y", SocketType::Float);
    let z = ctx.input("z", SocketType::Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "value", SocketType::Vec3, format!("vec3({x}, {y}, {z})"));
    code
}

fn compile_color(ctx: &GenContext<'_>) -> NodeCode {
    let color = ctx.input("color", SocketType::Vec3);
    let mut code = NodeCode::new();
    code.declare(ctx, "color", SocketType::Vec3, color);
    code
}
