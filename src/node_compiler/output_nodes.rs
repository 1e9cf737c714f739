//! Terminal nodes. Their `color` variable is what the assembler writes to the fragment.

use super::{GenContext, NodeCode};
use crate::schema::{NodeDefinition, NodeKind, NodeRegistry};
use crate::types::SocketType;

pub fn register(registry: &mut NodeRegistry) {
    registry.register(
        NodeDefinition::new("Output", "Output", compile_output)
            .kind(NodeKind::Output { alpha: false })
            .input("color", SocketType::Vec3, "Color"),
    );
    registry.register(
        NodeDefinition::new("OutputRgba", "Output", compile_output_rgba)
            .kind(NodeKind::Output { alpha: true })
            .input("color", SocketType::Vec4, "Color"),
    );
}

fn compile_output(ctx: &GenContext<'_>) -> NodeCode {
    let color = ctx.input("color", SocketType::Vec3);
    let mut code = NodeCode::new();
    code.declare(ctx, "color", SocketType::Vec3, color);
    code
}

fn compile_output_rgba(ctx: &GenContext<'_>) -> NodeCode {
    let color = ctx.input("color", SocketType::Vec4);
    let mut code = NodeCode::new();
    code.declare(ctx, "color", SocketType::Vec4, color);
    code
}
