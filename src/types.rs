//! Socket value types and typed GLSL expressions.

use serde::{Deserialize, Serialize};

/// GLSL value type carried by a socket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketType {
    Float,
    Vec2,
    Vec3,
    Vec4,
}

impl SocketType {
    /// Returns the GLSL type name for this socket type.
    pub fn glsl(self) -> &'static str {
        match self {
            SocketType::Float => "float",
            SocketType::Vec2 => "vec2",
            SocketType::Vec3 => "vec3",
            SocketType::Vec4 => "vec4",
        }
    }

    /// Zero value used when an input is left unresolved.
    ///
    /// `vec4` zero is opaque black because every vec4 socket in the catalog is
    /// a colour-with-alpha.
    pub fn zero_literal(self) -> &'static str {
        match self {
            SocketType::Float => "0.0",
            SocketType::Vec2 => "vec2(0.0)",
            SocketType::Vec3 => "vec3(0.0)",
            SocketType::Vec4 => "vec4(0.0, 0.0, 0.0, 1.0)",
        }
    }

    /// Number of scalar components.
    pub fn components(self) -> usize {
        match self {
            SocketType::Float => 1,
            SocketType::Vec2 => 2,
            SocketType::Vec3 => 3,
            SocketType::Vec4 => 4,
        }
    }

    /// Parse the names editors use for socket types.
    pub fn parse(s: &str) -> Option<SocketType> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float" | "f32" | "number" => Some(SocketType::Float),
            "vec2" | "vector2" => Some(SocketType::Vec2),
            "vec3" | "vector3" | "color" => Some(SocketType::Vec3),
            "vec4" | "vector4" | "rgba" => Some(SocketType::Vec4),
            _ => None,
        }
    }
}

/// Whether an output of type `source` may feed an input of type `target`.
///
/// Equal types always connect. The only coercion is `float -> vec3`; the
/// broadcast itself is emitted by the consuming generator.
pub fn is_compatible(source: SocketType, target: SocketType) -> bool {
    source == target || (source == SocketType::Float && target == SocketType::Vec3)
}

/// A typed GLSL expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedExpr {
    pub ty: SocketType,
    pub expr: String,
}

impl TypedExpr {
    pub fn new(expr: impl Into<String>, ty: SocketType) -> Self {
        Self {
            ty,
            expr: expr.into(),
        }
    }

    pub fn zero(ty: SocketType) -> Self {
        Self::new(ty.zero_literal(), ty)
    }
}

/// Splat a float expression to a target type.
pub fn splat_float(x: &TypedExpr, target: SocketType) -> TypedExpr {
    match target {
        SocketType::Float => x.clone(),
        SocketType::Vec2 => TypedExpr::new(format!("vec2({})", x.expr), SocketType::Vec2),
        SocketType::Vec3 => TypedExpr::new(format!("vec3({})", x.expr), SocketType::Vec3),
        SocketType::Vec4 => TypedExpr::new(
            format!("vec4(vec3({}), 1.0)", x.expr),
            SocketType::Vec4,
        ),
    }
}

/// Bring an expression to the type a consumer asked for.
///
/// Scalars broadcast. Anything else is returned unchanged: connections are
/// type-checked before generators run, so a mismatch here only happens when a
/// generator reads a socket with a type other than the declared one.
pub fn coerce_to_type(x: TypedExpr, target: SocketType) -> TypedExpr {
    if x.ty == target {
        return x;
    }
    if x.ty == SocketType::Float {
        return splat_float(&x, target);
    }
    x
}

/// Convert an expression to an rgb colour for previewing.
pub fn to_display_color(x: &TypedExpr) -> String {
    match x.ty {
        SocketType::Float => format!("vec3({})", x.expr),
        SocketType::Vec2 => format!("vec3({}, 0.0)", x.expr),
        SocketType::Vec3 => x.expr.clone(),
        SocketType::Vec4 => format!("({}).rgb", x.expr),
    }
}
