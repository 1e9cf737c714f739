//! Built-in node definitions and the generator contract.
//!
//! Every generator is total: it is handed whatever inputs happen to be wired
//! and substitutes params or typed zeros for the rest. This is what lets the
//! code generator call it without checking types at the call site.

pub mod input_nodes;
pub mod math_nodes;
pub mod trigonometry_nodes;
pub mod vector_nodes;
pub mod noise_nodes;
pub mod sdf_nodes;
pub mod color_nodes;
pub mod custom_nodes;
pub mod output_nodes;
pub mod loop_node;

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::dsl::{self, Node};
use crate::error::Diagnostic;
use crate::schema::{
    EffectiveInput, EffectiveOutput, NodeDefinition, NodeRegistry, effective_inputs,
    effective_outputs,
};
use crate::types::{SocketType, TypedExpr, coerce_to_type};
use crate::utils::{fmt_f32, fmt_vec, sanitize_glsl_ident, var_name};

/// Register every built-in node type.
pub fn register_builtins(registry: &mut NodeRegistry) {
    input_nodes::register(registry);
    math_nodes::register(registry);
    trigonometry_nodes::register(registry);
    vector_nodes::register(registry);
    noise_nodes::register(registry);
    sdf_nodes::register(registry);
    color_nodes::register(registry);
    custom_nodes::register(registry);
    output_nodes::register(registry);
    loop_node::register(registry);
}

/// What a generator sees: the node, its definition and its resolved inputs.
pub struct GenContext<'a> {
    pub node: &'a Node,
    pub definition: &'a NodeDefinition,
    prefix: String,
    symbol: String,
    inputs: Vec<EffectiveInput<'a>>,
    outputs: Vec<EffectiveOutput<'a>>,
    resolved: HashMap<String, TypedExpr>,
}

impl<'a> GenContext<'a> {
    /// `prefix` names this instance's variables; `resolved` holds the wired inputs.
    pub fn new(
        node: &'a Node,
        definition: &'a NodeDefinition,
        prefix: impl Into<String>,
        resolved: HashMap<String, TypedExpr>,
    ) -> Self {
        Self {
            node,
            definition,
            prefix: prefix.into(),
            symbol: sanitize_glsl_ident(&node.id),
            inputs: effective_inputs(node, definition),
            outputs: effective_outputs(node, definition),
            resolved,
        }
    }

    /// Name per-node helpers with a symbol other nodes cannot share.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Identifier for this node, the same in every loop iteration.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Variable name for one of this node's outputs.
    pub fn var(&self, output_key: &str) -> String {
        var_name(&self.prefix, output_key)
    }

    pub fn inputs(&self) -> &[EffectiveInput<'a>] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[EffectiveOutput<'a>] {
        &self.outputs
    }

    pub fn connected(&self, key: &str) -> Option<&TypedExpr> {
        self.resolved.get(key)
    }

    /// Instance param, falling back to the definition default.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.node
            .params
            .get(key)
            .or_else(|| self.definition.default_params.get(key))
    }

    pub fn param_f32(&self, key: &str, default: f32) -> f32 {
        self.param(key).and_then(dsl::parse_f32).unwrap_or(default)
    }

    pub fn param_u32(&self, key: &str, default: u32) -> u32 {
        self.param(key).and_then(dsl::parse_u32).unwrap_or(default)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.param(key).and_then(Value::as_str)
    }

    /// A param rendered as a GLSL literal of type `ty`.
    pub fn param_literal(&self, key: &str, ty: SocketType) -> Option<String> {
        let v = self.param(key)?;
        match ty {
            SocketType::Float => dsl::parse_f32(v).map(fmt_f32),
            _ => dsl::parse_vec_param(v, ty.components()).map(|c| fmt_vec(&c)),
        }
    }

    /// Expression for input `key` as type `ty`.
    ///
    /// Wired input (broadcast if scalar), else the same-named param, else zero.
    pub fn input(&self, key: &str, ty: SocketType) -> String {
        self.input_typed(key, ty).expr
    }

    pub fn input_typed(&self, key: &str, ty: SocketType) -> TypedExpr {
        if let Some(x) = self.connected(key) {
            return coerce_to_type(x.clone(), ty);
        }
        match self.param_literal(key, ty) {
            Some(lit) => TypedExpr::new(lit, ty),
            None => TypedExpr::zero(ty),
        }
    }

    /// Declared type of an input socket on this instance.
    pub fn input_type(&self, key: &str) -> Option<SocketType> {
        self.inputs.iter().find(|s| s.key == key).map(|s| s.ty)
    }

    /// Declared type of an output socket on this instance.
    pub fn output_type(&self, key: &str) -> Option<SocketType> {
        self.outputs.iter().find(|s| s.key == key).map(|s| s.ty)
    }
}

/// Statement text and output variables produced by one generator call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeCode {
    pub code: String,
    /// Output key -> typed variable reference, in declaration order.
    pub outputs: Vec<(String, TypedExpr)>,
    /// Per-instance helper blocks, in addition to the definition's shared ones.
    pub helpers: Vec<String>,
    /// Local problems; the generated code is still usable.
    pub diagnostics: Vec<Diagnostic>,
}

impl NodeCode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `ty var = expr;` for `output_key` and record the variable.
    pub fn declare(
        &mut self,
        ctx: &GenContext<'_>,
        output_key: &str,
        ty: SocketType,
        expr: impl AsRef<str>,
    ) -> String {
        let var = ctx.var(output_key);
        self.line(format!("{} {var} = {};", ty.glsl(), expr.as_ref()));
        self.outputs
            .push((output_key.to_string(), TypedExpr::new(var.clone(), ty)));
        var
    }

    pub fn line(&mut self, line: impl AsRef<str>) {
        if !self.code.is_empty() {
            self.code.push('\n');
        }
        self.code.push_str(line.as_ref());
    }

    pub fn helper(&mut self, glsl: impl Into<String>) {
        self.helpers.push(glsl.into());
    }

    pub fn output(&self, key: &str) -> Option<&TypedExpr> {
        self.outputs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn output_vars(&self) -> BTreeMap<String, String> {
        self.outputs
            .iter()
            .map(|(k, v)| (k.clone(), v.expr.clone()))
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::test_utils::{generate, test_node};
    use super::*;
    use serde_json::json;

    #[test]
    fn input_prefers_wire_then_param_then_zero() {
        let registry = NodeRegistry::builtin();
        let node = test_node(&registry, "m", "Mix").with_param("t", json!(0.25));
        let def = registry.lookup("Mix").unwrap();
        let resolved = HashMap::from([(
            "a".to_string(),
            TypedExpr::new("x_out", SocketType::Float),
        )]);
        let ctx = GenContext::new(&node, def, "m", resolved);

        assert_eq!(ctx.input("a", SocketType::Float), "x_out");
        assert_eq!(ctx.input("a", SocketType::Vec3), "vec3(x_out)");
        assert_eq!(ctx.input("t", SocketType::Float), "0.25");
        assert_eq!(ctx.input("nope", SocketType::Vec2), "vec2(0.0)");
    }

    #[test]
    fn vector_params_render_as_constructors() {
        let registry = NodeRegistry::builtin();
        let node = test_node(&registry, "c", "Color").with_param("color", json!([1, 0.5, 0]));
        let def = registry.lookup("Color").unwrap();
        let ctx = GenContext::new(&node, def, "c", HashMap::new());
        assert_eq!(
            ctx.param_literal("color", SocketType::Vec3).as_deref(),
            Some("vec3(1.0, 0.5, 0.0)")
        );
    }

    #[test]
    fn declare_records_typed_outputs() {
        let registry = NodeRegistry::builtin();
        let node = test_node(&registry, "f", "Float").with_param("value", json!(3));
        let code = generate(&registry, &node, &[]);
        assert_eq!(code.code, "float f_value = 3.0;");
        assert_eq!(
            code.output("value"),
            Some(&TypedExpr::new("f_value", SocketType::Float))
        );
        assert_eq!(code.output_vars()["value"], "f_value");
    }
}
