//! GLSL validation using the naga library.
//!
//! The compiler does not need this to produce shaders; it backs the CLI's
//! `--validate` flag and the tests. naga's GLSL frontend reads desktop GLSL
//! 4.50, so validate sources built with [`ShaderPrologue::glsl450`].
//!
//! [`ShaderPrologue::glsl450`]: crate::config::ShaderPrologue::glsl450

use anyhow::{Context, Result, anyhow};

/// Parse and validate a fragment shader.
///
/// # Returns
/// The parsed naga Module on success, or an error listing the numbered source.
pub fn validate_glsl_fragment(source: &str) -> Result<naga::Module> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options {
        stage: naga::ShaderStage::Fragment,
        defines: Default::default(),
    };

    let module = frontend
        .parse(&options, source)
        .map_err(|e| anyhow!("GLSL parse failed: {e:?}\n{}", numbered_source(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| anyhow!("GLSL validation failed: {e:?}\n{}", numbered_source(source)))?;

    Ok(module)
}

/// Validate and say which compile produced the source.
pub fn validate_glsl_fragment_with_context(source: &str, context: &str) -> Result<naga::Module> {
    validate_glsl_fragment(source).with_context(|| format!("{context} generated invalid GLSL"))
}

fn numbered_source(source: &str) -> String {
    let mut output = String::from("Generated GLSL:\n---\n");
    for (line_num, line) in source.lines().enumerate() {
        output.push_str(&format!("{:4} | {}\n", line_num + 1, line));
    }
    output.push_str("---\n");
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_minimal_fragment_shader() {
        let source = r#"#version 450
layout(location = 0) out vec4 fragColor;

void main() {
    fragColor = vec4(1.0, 0.0, 0.0, 1.0);
}
"#;
        assert!(validate_glsl_fragment(source).is_ok());
    }

    #[test]
    fn rejects_syntax_errors_with_context() {
        let result = validate_glsl_fragment_with_context("#version 450\nvoid main() { float x = ; }", "preview of n1");
        let err_msg = format!("{:#}", result.unwrap_err());
        assert!(err_msg.contains("preview of n1"));
        assert!(err_msg.contains("   2 | void main()"));
    }
}
