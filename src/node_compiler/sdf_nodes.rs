//! Compilers for 2D signed distance field (SDF) nodes.

use serde_json::json;

use super::{GenContext, NodeCode};
use crate::schema::{GenerateFn, NodeDefinition, NodeRegistry};
use crate::types::SocketType::{Float, Vec2};

pub const SMIN_GLSL: &str = r#"float smin(float a, float b, float k) {
    float h = clamp(0.5 + 0.5 * (b - a) / k, 0.0, 1.0);
    return mix(b, a, h) - k * h * (1.0 - h);
}"#;

pub const SMAX_GLSL: &str = r#"float smax(float a, float b, float k) {
    float h = clamp(0.5 - 0.5 * (b - a) / k, 0.0, 1.0);
    return mix(b, a, h) + k * h * (1.0 - h);
}"#;

pub const SD_BOX_GLSL: &str = r#"float sd_box(vec2 p, vec2 b) {
    vec2 d = abs(p) - b;
    return length(max(d, 0.0)) + min(max(d.x, d.y), 0.0);
}"#;

fn combine(node_type: &str, generate: GenerateFn) -> NodeDefinition {
    NodeDefinition::new(node_type, "SDF", generate)
        .input("a", Float, "A")
        .input("b", Float, "B")
        .output("out", Float, "Distance")
}

pub fn register(registry: &mut NodeRegistry) {
    registry.register(
        NodeDefinition::new("SdCircle", "SDF", compile_circle)
            .input("p", Vec2, "Position")
            .input("center", Vec2, "Center")
            .input("radius", Float, "Radius")
            .param("center", json!([0.5, 0.5]))
            .param("radius", json!(0.25))
            .output("out", Float, "Distance"),
    );
    registry.register(
        NodeDefinition::new("SdBox", "SDF", compile_box)
            .input("p", Vec2, "Position")
            .input("center", Vec2, "Center")
            .input("size", Vec2, "Half Size")
            .param("center", json!([0.5, 0.5]))
            .param("size", json!([0.2, 0.2]))
            .output("out", Float, "Distance")
            .helper(SD_BOX_GLSL),
    );
    registry.register(
        combine("SmoothMin", compile_smooth_min)
            .input("k", Float, "Smoothness")
            .param("k", json!(0.1))
            .helper(SMIN_GLSL),
    );
    registry.register(
        combine("SmoothMax", compile_smooth_max)
            .input("k", Float, "Smoothness")
            .param("k", json!(0.1))
            .helper(SMAX_GLSL),
    );
    registry.register(combine("SdfUnion", compile_union));
    registry.register(combine("SdfIntersect", compile_intersect));
    registry.register(combine("SdfSubtract", compile_subtract));
    registry.register(
        NodeDefinition::new("SdfFill", "SDF", compile_fill)
            .input("d", Float, "Distance")
            .input("softness", Float, "Softness")
            .param("softness", json!(0.005))
            .output("mask", Float, "Mask"),
    );
}

fn compile_circle(ctx: &GenContext<'_>) -> NodeCode {
    let p = ctx.input("p", Vec2);
    let center = ctx.input("center", Vec2);
    let radius = ctx.input("radius", Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", Float, format!("length({p} - {center}) - {radius}"));
    code
}

fn compile_box(ctx: &GenContext<'_>) -> NodeCode {
    let p = ctx.input("p", Vec2);
    let center = ctx.input("center", Vec2);
    let size = ctx.input("size", Vec2);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", Float, format!("sd_box({p} - {center}, {size})"));
    code
}

fn emit_smooth(ctx: &GenContext<'_>, func: &str) -> NodeCode {
    let a = ctx.input("a", Float);
    let b = ctx.input("b", Float);
    let k = ctx.input("k", Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", Float, format!("{func}({a}, {b}, max({k}, 1e-4))"));
    code
}

fn compile_smooth_min(ctx: &GenContext<'_>) -> NodeCode {
    emit_smooth(ctx, "smin")
}

fn compile_smooth_max(ctx: &GenContext<'_>) -> NodeCode {
    emit_smooth(ctx, "smax")
}

fn compile_union(ctx: &GenContext<'_>) -> NodeCode {
    let a = ctx.input("a", Float);
    let b = ctx.input("b", Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", Float, format!("min({a}, {b})"));
    code
}

fn compile_intersect(ctx: &GenContext<'_>) -> NodeCode {
    let a = ctx.input("a", Float);
    let b = ctx.input("b", Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", Float, format!("max({a}, {b})"));
    code
}

/// `a` with `b` carved out.
fn compile_subtract(ctx: &GenContext<'_>) -> NodeCode {
    let a = ctx.input("a", Float);
    let b = ctx.input("b", Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "out", Float, format!("max({a}, -({b}))"));
    code
}

fn compile_fill(ctx: &GenContext<'_>) -> NodeCode {
    let d = ctx.input("d", Float);
    let softness = ctx.input("softness", Float);
    let mut code = NodeCode::new();
    code.declare(
        ctx,
        "mask",
        Float,
        format!("1.0 - smoothstep(0.0, max({softness}, 1e-4), {d})"),
    );
    code
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{generate, test_node};
    use super::*;
    use crate::types::{SocketType, TypedExpr};

    #[test]
    fn smooth_min_calls_the_shared_helper() {
        let registry = NodeRegistry::builtin();
        let code = generate(
            &registry,
            &test_node(&registry, "s1", "SmoothMin"),
            &[
                ("a", TypedExpr::new("c_out", SocketType::Float)),
                ("b", TypedExpr::new("b_out", SocketType::Float)),
            ],
        );
        assert_eq!(code.code, "float s1_out = smin(c_out, b_out, max(0.1, 1e-4));");
        assert_eq!(
            registry.lookup("SmoothMin").unwrap().glsl_functions,
            vec![SMIN_GLSL]
        );
    }

    #[test]
    fn circle_defaults_are_centered() {
        let registry = NodeRegistry::builtin();
        let code = generate(&registry, &test_node(&registry, "c", "SdCircle"), &[]);
        assert_eq!(
            code.code,
            "float c_out = length(vec2(0.0) - vec2(0.5, 0.5)) - 0.25;"
        );
    }

    #[test]
    fn subtract_negates_the_second_operand() {
        let registry = NodeRegistry::builtin();
        let code = generate(&registry, &test_node(&registry, "s", "SdfSubtract"), &[]);
        assert_eq!(code.code, "float s_out = max(0.0, -(0.0));");
    }
}
