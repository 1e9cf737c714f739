//! Vector construction, decomposition and UV-space transforms.

use serde_json::json;

use super::{GenContext, NodeCode};
use crate::schema::{NodeDefinition, NodeRegistry};
use crate::types::SocketType::{Float, Vec2, Vec3};

pub fn register(registry: &mut NodeRegistry) {
    registry.register(
        NodeDefinition::new("Length", "Vector", compile_length)
            .input("v", Vec2, "Vector")
            .output("out", Float, "Length"),
    );
    registry.register(
        NodeDefinition::new("Distance", "Vector", compile_distance)
            .input("a", Vec2, "A")
            .input("b", Vec2, "B")
            .param("b", json!([0.5, 0.5]))
            .output("out", Float, "Distance"),
    );
    registry.register(
        NodeDefinition::new("SplitVec2", "Vector", compile_split_vec2)
            .input("v", Vec2, "Vector")
            .output("x", Float, "X")
            .output("y", Float, "Y"),
    );
    registry.register(
        NodeDefinition::new("SplitVec3", "Vector", compile_split_vec3)
            .input("v", Vec3, "Vector")
            .output("x", Float, "X")
            .output("y", Float, "Y")
            .output("z", Float, "Z"),
    );
    registry.register(
        NodeDefinition::new("CombineVec3", "Vector", compile_combine_vec3)
            .input("x", Float, "X")
            .input("y", Float, "Y")
            .input("z", Float, "Z")
            .output("out", Vec3, "Vector"),
    );
    registry.register(
        NodeDefinition::new("Rotate2D", "Vector", compile_rotate_2d)
            .input("uv", Vec2, "UV")
            .input("angle", Float, "Angle")
            .input("center", Vec2, "Center")
            .param("center", json!([0.5, 0.5]))
            .output("uv", Vec2, "UV"),
    );
    registry.register(
        NodeDefinition::new("ScaleUV", "Vector", compile_scale_uv)
            .input("uv", Vec2, "UV")
            .input("scale", Float, "Scale")
            .input("offset", Vec2, "Offset")
            .param("scale", json!(1.0))
            .output("uv", Vec2, "UV"),
    );
    registry.register(
        NodeDefinition::new("Polar", "Vector", compile_polar)
            .input("uv", Vec2, "UV")
            .input("center", Vec2, "Center")
            .param("center", json!([0.5, 0.5]))
            .output("radius", Float, "Radius")
            .output("angle", Float, "Angle"),
    );
}

fn compile_length(ctx: &GenContext<'_>) -> NodeCode {
    let v = ctx.input("v", Vec2);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", Float, format!("length({v})"));
    code
}

fn compile_distance(ctx: &GenContext<'_>) -> NodeCode {
    let a = ctx.input("a", Vec2);
    let b = ctx.input("b", Vec2);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", Float, format!("distance({a}, {b})"));
    code
}

fn compile_split_vec2(ctx: &GenContext<'_>) -> NodeCode {
    let v = ctx.input("v", Vec2);
    let mut code = NodeCode::new();
    code.declare(ctx, "x", Float, format!("({v}).x"));
    code.declare(ctx, "y", Float, format!("({v}).y"));
    code
}

fn compile_split_vec3(ctx: &GenContext<'_>) -> NodeCode {
    let v = ctx.input("v", Vec3);
    let mut code = NodeCode::new();
    code.declare(ctx, "x", Float, format!("({v}).x"));
    code.declare(ctx, "y", Float, format!("({v}).y"));
    code.declare(ctx, "z", Float, format!("({v}).z"));
    code
}

fn compile_combine_vec3(ctx: &GenContext<'_>) -> NodeCode {
    let x = ctx.input("x", Float);
    let y = ctx.input("y", Float);
    let z = ctx.input("z", Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", Vec3, format!("vec3({x}, {y}, {z})"));
    code
}

/// Rotate around `center` by `angle` radians.
fn compile_rotate_2d(ctx: &GenContext<'_>) -> NodeCode {
    let uv = ctx.input("uv", Vec2);
    let angle = ctx.input("angle", Float);
    let center = ctx.input("center", Vec2);
    let mut code = NodeCode::new();
    code.declare(
        ctx,
        "uv",
        Vec2,
        format!(
            "mat2(cos({angle}), sin({angle}), -sin({angle}), cos({angle})) * ({uv} - {center}) + {center}"
        ),
    );
    code
}

fn compile_scale_uv(ctx: &GenContext<'_>) -> NodeCode {
    let uv = ctx.input("uv", Vec2);
    let scale = ctx.input("scale", Float);
    let offset = ctx.input("offset", Vec2);
    let mut code = NodeCode::new();
    code.declare(ctx, "uv", Vec2, format!("{uv} * {scale} + {offset}"));
    code
}

fn compile_polar(ctx: &GenContext<'_>) -> NodeCode {
    let uv = ctx.input("uv", Vec2);
    let center = ctx.input("center", Vec2);
    let mut code = NodeCode::new();
    let d = ctx.var("delta");
    code.line(format!("vec2 {d} = {uv} - {center};"));
    code.declare(ctx, "radius", Float, format!("length({d})"));
    code.declare(ctx, "angle", Float, format!("atan({d}.y, {d}.x)"));
    code
}
