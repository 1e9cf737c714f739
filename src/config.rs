//! Compiler configuration.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Shader text the rendering side owns: everything outside `main()` that is
/// not a helper block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShaderPrologue {
    /// Emitted first, before any helper (`#version`, precision).
    pub header: String,
    /// Uniform and varying declarations, emitted after the helpers.
    pub declarations: String,
    /// Terminal write target.
    pub frag_color: String,
}

impl ShaderPrologue {
    /// WebGL 1 / GLSL ES 1.00, as run by the browser preview.
    pub fn webgl() -> Self {
        Self {
            header: "precision highp float;".to_string(),
            declarations: [
                "uniform float u_time;",
                "uniform vec2 u_resolution;",
                "varying vec2 vUv;",
            ]
            .join("\n"),
            frag_color: "gl_FragColor".to_string(),
        }
    }

    /// Desktop GLSL 4.50. Accepted by naga's GLSL frontend.
    pub fn glsl450() -> Self {
        Self {
            header: "#version 450".to_string(),
            declarations: [
                "layout(location = 0) in vec2 vUv;",
                "layout(location = 0) out vec4 fragColor;",
                "layout(set = 0, binding = 0) uniform Globals {",
                "    float u_time;",
                "    vec2 u_resolution;",
                "};",
            ]
            .join("\n"),
            frag_color: "fragColor".to_string(),
        }
    }
}

impl Default for ShaderPrologue {
    fn default() -> Self {
        Self::webgl()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    pub prologue: ShaderPrologue,
    /// Loop `iterations` params are clamped to this.
    pub max_loop_iterations: u32,
    /// Keep the last successful compile and return it for an identical request.
    pub memoize: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            prologue: ShaderPrologue::default(),
            max_loop_iterations: 64,
            memoize: true,
        }
    }
}

impl CompilerConfig {
    pub fn glsl450() -> Self {
        Self {
            prologue: ShaderPrologue::glsl450(),
            ..Self::default()
        }
    }
}

pub fn load_config_from_str(text: &str) -> Result<CompilerConfig> {
    serde_json::from_str(text).context("failed to parse compiler config json")
}

pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<CompilerConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read compiler config at {}", path.display()))?;
    load_config_from_str(&text).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg = load_config_from_str(r#"{ "maxLoopIterations": 8 }"#).unwrap();
        assert_eq!(cfg.max_loop_iterations, 8);
        assert!(cfg.memoize);
        assert_eq!(cfg.prologue, ShaderPrologue::webgl());
    }

    #[test]
    fn prologue_fields_are_camel_case() {
        let cfg = load_config_from_str(
            r##"{ "prologue": { "header": "#version 300 es", "fragColor": "outColor" } }"##,
        )
        .unwrap();
        assert_eq!(cfg.prologue.header, "#version 300 es");
        assert_eq!(cfg.prologue.frag_color, "outColor");
        // Unset prologue fields come from the WebGL preset.
        assert_eq!(cfg.prologue.declarations, ShaderPrologue::webgl().declarations);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = load_config_from_str("{ memoize: yes }").unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse compiler config json"));
    }
}
