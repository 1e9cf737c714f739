//! Procedural noise nodes.
//!
//! All three share the `hash22` primitive. Its text is identical in every
//! definition so the helper set keeps a single copy.

use serde_json::json;

use super::{GenContext, NodeCode};
use crate::schema::{NodeDefinition, NodeRegistry};
use crate::types::SocketType::{Float, Vec2};

pub const HASH22_GLSL: &str = r#"vec2 hash22(vec2 p) {
    p = vec2(dot(p, vec2(127.1, 311.7)), dot(p, vec2(269.5, 183.3)));
    return fract(sin(p) * 43758.5453123);
}"#;

pub const GRADIENT_NOISE_GLSL: &str = r#"float gradient_noise(vec2 p) {
    vec2 i = floor(p);
    vec2 f = fract(p);
    vec2 u = f * f * (3.0 - 2.0 * f);
    float a = dot(hash22(i) * 2.0 - 1.0, f);
    float b = dot(hash22(i + vec2(1.0, 0.0)) * 2.0 - 1.0, f - vec2(1.0, 0.0));
    float c = dot(hash22(i + vec2(0.0, 1.0)) * 2.0 - 1.0, f - vec2(0.0, 1.0));
    float d = dot(hash22(i + vec2(1.0, 1.0)) * 2.0 - 1.0, f - vec2(1.0, 1.0));
    return mix(mix(a, b, u.x), mix(c, d, u.x), u.y);
}"#;

pub const FBM_GLSL: &str = r#"float fbm(vec2 p, int octaves, float gain) {
    float sum = 0.0;
    float amp = 0.5;
    for (int i = 0; i < 8; i++) {
        if (i >= octaves) break;
        sum += amp * gradient_noise(p);
        p *= 2.0;
        amp *= gain;
    }
    return sum;
}"#;

pub const VORONOI_GLSL: &str = r#"vec2 voronoi(vec2 p) {
    vec2 n = floor(p);
    vec2 f = fract(p);
    float md = 8.0;
    vec2 mc = vec2(0.0);
    for (int j = -1; j <= 1; j++) {
        for (int i = -1; i <= 1; i++) {
            vec2 g = vec2(float(i), float(j));
            vec2 r = g + hash22(n + g) - f;
            float d = dot(r, r);
            if (d < md) {
                md = d;
                mc = n + g;
            }
        }
    }
    return vec2(sqrt(md), fract(sin(dot(mc, vec2(12.9898, 78.233))) * 43758.5453));
}"#;

/// Upper bound of the fixed fbm loop.
pub const MAX_OCTAVES: u32 = 8;

pub fn register(registry: &mut NodeRegistry) {
    registry.register(
        NodeDefinition::new("Noise", "Noise", compile_noise)
            .input("uv", Vec2, "UV")
            .input("scale", Float, "Scale")
            .param("scale", json!(4.0))
            .output("value", Float, "Value")
            .helper(HASH22_GLSL)
            .helper(GRADIENT_NOISE_GLSL),
    );
    registry.register(
        NodeDefinition::new("Fbm", "Noise", compile_fbm)
            .input("uv", Vec2, "UV")
            .input("scale", Float, "Scale")
            .input("gain", Float, "Gain")
            .param("scale", json!(4.0))
            .param("gain", json!(0.5))
            .param("octaves", json!(5))
            .output("value", Float, "Value")
            .helper(HASH22_GLSL)
            .helper(GRADIENT_NOISE_GLSL)
            .helper(FBM_GLSL),
    );
    registry.register(
        NodeDefinition::new("Voronoi", "Noise", compile_voronoi)
            .input("uv", Vec2, "UV")
            .input("scale", Float, "Scale")
            .param("scale", json!(6.0))
            .output("distance", Float, "Distance")
            .output("cell", Float, "Cell")
            .helper(HASH22_GLSL)
            .helper(VORONOI_GLSL),
    );
}

fn compile_noise(ctx: &GenContext<'_>) -> NodeCode {
    let uv = ctx.input("uv", Vec2);
    let scale = ctx.input("scale", Float);
    let mut code = NodeCode::new();
    code.declare(
        ctx,
        "value",
        Float,
        format!("0.5 + 0.5 * gradient_noise({uv} * {scale})"),
    );
    code
}

fn compile_fbm(ctx: &GenContext<'_>) -> NodeCode {
    let uv = ctx.input("uv", Vec2);
    let scale = ctx.input("scale", Float);
    let gain = ctx.input("gain", Float);
    let octaves = ctx.param_u32("octaves", 5).clamp(1, MAX_OCTAVES);
    let mut code = NodeCode::new();
    code.declare(
        ctx,
        "value",
        Float,
        format!("0.5 + 0.5 * fbm({uv} * {scale}, {octaves}, {gain})"),
    );
    code
}

fn compile_voronoi(ctx: &GenContext<'_>) -> NodeCode {
    let uv = ctx.input("uv", Vec2);
    let scale = ctx.input("scale", Float);
    let mut code = NodeCode::new();
    let v = ctx.var("cells");
    code.line(format!("vec2 {v} = voronoi({uv} * {scale});"));
    code.declare(ctx, "distance", Float, format!("{v}.x"));
    code.declare(ctx, "cell", Float, format!("{v}.y"));
    code
}
