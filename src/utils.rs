//! Utility functions shared by the generators and the compiler.

/// Format a float as a GLSL float literal.
///
/// GLSL ES does not promote integer literals, so the result always keeps a
/// decimal point (`2.0`, never `2`).
pub fn fmt_f32(v: f32) -> String {
    if v.is_finite() {
        let s = format!("{v:.6}");
        let mut s = s.trim_end_matches('0').to_string();
        if s.ends_with('.') {
            s.push('0');
        }
        if s == "-0.0" {
            s = "0.0".to_string();
        }
        s
    } else {
        "0.0".to_string()
    }
}

/// Format a vector literal, e.g. `vec3(1.0, 0.5, 0.0)`.
pub fn fmt_vec(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().copied().map(fmt_f32).collect();
    format!("vec{}({})", values.len(), parts.join(", "))
}

/// Sanitize a string to be a valid GLSL identifier.
pub fn sanitize_glsl_ident(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 1);
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'n');
    }
    // GLSL reserves identifiers containing a double underscore.
    while out.contains("__") {
        out = out.replace("__", "_");
    }
    out
}

/// Generated variable name for a node output.
pub fn var_name(prefix: &str, output_key: &str) -> String {
    sanitize_glsl_ident(&format!("{prefix}_{output_key}"))
}

/// Indent every non-empty line of `text` by `levels` * 4 spaces.
pub fn indent(text: &str, levels: usize) -> String {
    let pad = "    ".repeat(levels);
    text.lines()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                format!("{pad}{l}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
