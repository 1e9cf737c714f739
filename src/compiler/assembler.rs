//! Stitches helpers, prologue and statements into one fragment shader.

use super::codegen::HelperSet;
use crate::config::ShaderPrologue;
use crate::schema::NodeKind;
use crate::types::{TypedExpr, to_display_color};
use crate::utils::indent;

/// The statement that writes the fragment colour.
///
/// Output nodes write their own `color` variable; any other node is previewed
/// through its first output, converted to an rgb colour. `None` when the node
/// produced nothing to show.
pub fn terminal_write(
    kind: NodeKind,
    outputs: &[(String, TypedExpr)],
    frag_color: &str,
) -> Option<String> {
    match kind {
        NodeKind::Output { alpha } => {
            let (_, color) = outputs.iter().find(|(k, _)| k == "color")?;
            if alpha {
                Some(format!("{frag_color} = {};", color.expr))
            } else {
                Some(format!("{frag_color} = vec4({}, 1.0);", color.expr))
            }
        }
        NodeKind::Plain | NodeKind::Loop => {
            let (_, first) = outputs.first()?;
            Some(format!(
                "{frag_color} = vec4({}, 1.0);",
                to_display_color(first)
            ))
        }
    }
}

/// Layout: header, helper blocks, declarations, then `main()` with the
/// statements and the terminal write.
pub fn assemble(
    prologue: &ShaderPrologue,
    helpers: &HelperSet,
    statements: &[String],
    terminal: &str,
) -> String {
    let mut sections: Vec<String> = Vec::new();
    if !prologue.header.trim().is_empty() {
        sections.push(prologue.header.trim_end().to_string());
    }
    sections.extend(helpers.iter().map(|h| h.trim_end().to_string()));
    if !prologue.declarations.trim().is_empty() {
        sections.push(prologue.declarations.trim_end().to_string());
    }

    let mut main = String::from("void main() {\n");
    for block in statements {
        main.push_str(&indent(block, 1));
        main.push('\n');
    }
    main.push_str(&indent(terminal, 1));
    main.push_str("\n}");
    sections.push(main);

    let mut source = sections.join("\n\n");
    source.push('\n');
    source
}
