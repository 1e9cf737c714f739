//! Compilers for color nodes.

use serde_json::json;

use super::{GenContext, NodeCode};
use crate::schema::{NodeDefinition, NodeRegistry};
use crate::types::SocketType::{Float, Vec3};

/// Cosine palette `a + b * cos(2pi * (c * t + d))`.
pub const PALETTE_GLSL: &str = r#"vec3 palette(float t, vec3 a, vec3 b, vec3 c, vec3 d) {
    return a + b * cos(6.28318530718 * (c * t + d));
}"#;

pub const HSV2RGB_GLSL: &str = r#"vec3 hsv2rgb(vec3 c) {
    vec3 p = abs(fract(c.xxx + vec3(1.0, 2.0 / 3.0, 1.0 / 3.0)) * 6.0 - 3.0);
    return c.z * mix(vec3(1.0), clamp(p - 1.0, 0.0, 1.0), c.y);
}"#;

pub fn register(registry: &mut NodeRegistry) {
    registry.register(
        NodeDefinition::new("Palette", "Color", compile_palette)
            .input("t", Float, "T")
            .input("a", Vec3, "Bias")
            .input("b", Vec3, "Amplitude")
            .input("c", Vec3, "Frequency")
            .input("d", Vec3, "Phase")
            .param("a", json!([0.5, 0.5, 0.5]))
            .param("b", json!([0.5, 0.5, 0.5]))
            .param("c", json!([1.0, 1.0, 1.0]))
            .param("d", json!([0.0, 0.33, 0.67]))
            .output("color", Vec3, "Color")
            .helper(PALETTE_GLSL),
    );
    registry.register(
        NodeDefinition::new("HsvToRgb", "Color", compile_hsv_to_rgb)
            .input("h", Float, "Hue")
            .input("s", Float, "Saturation")
            .input("v", Float, "Value")
            .param("s", json!(1.0))
            .param("v", json!(1.0))
            .output("color", Vec3, "Color")
            .helper(HSV2RGB_GLSL),
    );
    registry.register(
        NodeDefinition::new("Grayscale", "Color", compile_grayscale)
            .input("color", Vec3, "Color")
            .output("value", Float, "Luminance"),
    );
    registry.register(
        NodeDefinition::new("Invert", "Color", compile_invert)
            .input("color", Vec3, "Color")
            .output("color", Vec3, "Color"),
    );
    registry.register(
        NodeDefinition::new("ColorMix", "Color", compile_color_mix)
            .input("a", Vec3, "A")
            .input("b", Vec3, "B")
            .input("t", Float, "T")
            .param("b", json!([1.0, 1.0, 1.0]))
            .param("t", json!(0.5))
            .output("color", Vec3, "Color"),
    );
    registry.register(
        NodeDefinition::new("Brightness", "Color", compile_brightness)
            .input("color", Vec3, "Color")
            .input("amount", Float, "Amount")
            .param("amount", json!(1.0))
            .output("color", Vec3, "Color"),
    );
}

fn compile_palette(ctx: &GenContext<'_>) -> NodeCode {
    let t = ctx.input("t", Float);
    let a = ctx.input("a", Vec3);
    let b = ctx.input("b", Vec3);
    let c = ctx.input("c", Vec3);
    let d = ctx.input("d", Vec3);
    let mut code = NodeCode::new();
    code.declare(ctx, "color", Vec3, format!("palette({t}, {a}, {b}, {c}, {d})"));
    code
}

fn compile_hsv_to_rgb(ctx: &GenContext<'_>) -> NodeCode {
    let h = ctx.input("h", Float);
    let s = ctx.input("s", Float);
    let v = ctx.input("v", Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "color", Vec3, format!("hsv2rgb(vec3({h}, {s}, {v}))"));
    code
}

/// Rec. 709 luma.
fn compile_grayscale(ctx: &GenContext<'_>) -> NodeCode {
    let color = ctx.input("color", Vec3);
    let mut code = NodeCode::new();
    code.declare(
        ctx,
        "value",
        Float,
        format!("dot({color}, vec3(0.2126, 0.7152, 0.0722))"),
    );
    code
}

fn compile_invert(ctx: &GenContext<'_>) -> NodeCode {
    let color = ctx.input("color", Vec3);
    let mut code = NodeCode::new();
    code.declare(ctx, "color", Vec3, format!("vec3(1.0) - {color}"));
    code
}

fn compile_color_mix(ctx: &GenContext<'_>) -> NodeCode {
    let a = ctx.input("a", Vec3);
    let b = ctx.input("b", Vec3);
    let t = ctx.input("t", Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "color", Vec3, format!("mix({a}, {b}, {t})"));
    code
}

fn compile_brightness(ctx: &GenContext<'_>) -> NodeCode {
    let color = ctx.input("color", Vec3);
    let amount = ctx.input("amount", Float);
    let mut code = NodeCode::new();
    code.declare(ctx, "color", Vec3, format!("{color} * {amount}"));
    code
}
