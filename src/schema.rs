//! Node definitions and the registry the compiler is constructed with.

use std::collections::HashMap;

use serde_json::Value;

use crate::dsl::{ConnectionRef, Node};
use crate::node_compiler::{GenContext, NodeCode};
use crate::types::SocketType;

/// Static socket declaration on a node type.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketDef {
    pub key: String,
    pub ty: SocketType,
    pub label: String,
}

impl SocketDef {
    pub fn new(key: &str, ty: SocketType, label: &str) -> Self {
        Self {
            key: key.to_string(),
            ty,
            label: label.to_string(),
        }
    }
}

/// How the compiler treats a node type beyond calling its generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Plain,
    /// Terminal write target. `alpha` selects the vec4 variant.
    Output { alpha: bool },
    /// Expanded by the loop expander instead of its generator.
    Loop,
}

/// Pure code generator: reads the node and its resolved inputs, never fails.
pub type GenerateFn = fn(&GenContext<'_>) -> NodeCode;

#[derive(Debug, Clone)]
pub struct NodeDefinition {
    pub node_type: String,
    pub category: &'static str,
    pub kind: NodeKind,
    pub inputs: Vec<SocketDef>,
    pub outputs: Vec<SocketDef>,
    pub default_params: HashMap<String, Value>,
    /// Shared helper blocks, dependency-first. Deduplicated by exact text.
    pub glsl_functions: Vec<&'static str>,
    pub generate: GenerateFn,
}

impl NodeDefinition {
    pub fn new(node_type: &str, category: &'static str, generate: GenerateFn) -> Self {
        Self {
            node_type: node_type.to_string(),
            category,
            kind: NodeKind::Plain,
            inputs: Vec::new(),
            outputs: Vec::new(),
            default_params: HashMap::new(),
            glsl_functions: Vec::new(),
            generate,
        }
    }

    pub fn kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn input(mut self, key: &str, ty: SocketType, label: &str) -> Self {
        self.inputs.push(SocketDef::new(key, ty, label));
        self
    }

    pub fn output(mut self, key: &str, ty: SocketType, label: &str) -> Self {
        self.outputs.push(SocketDef::new(key, ty, label));
        self
    }

    pub fn param(mut self, key: &str, value: Value) -> Self {
        self.default_params.insert(key.to_string(), value);
        self
    }

    pub fn helper(mut self, glsl: &'static str) -> Self {
        self.glsl_functions.push(glsl);
        self
    }
}

/// Immutable map from node type name to its definition.
///
/// Built once and handed to the compiler; there is no process-wide registry.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    definitions: HashMap<String, NodeDefinition>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in node type.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        crate::node_compiler::register_builtins(&mut registry);
        registry
    }

    /// Register a definition, replacing any previous one of the same type.
    pub fn register(&mut self, def: NodeDefinition) {
        self.definitions.insert(def.node_type.clone(), def);
    }

    pub fn lookup(&self, node_type: &str) -> Option<&NodeDefinition> {
        self.definitions.get(node_type)
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.definitions.contains_key(node_type)
    }

    /// Registered type names, sorted.
    pub fn node_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// A node's input socket as the compiler sees it.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveInput<'a> {
    pub key: &'a str,
    pub ty: SocketType,
    pub connection: Option<&'a ConnectionRef>,
}

/// A node's output socket as the compiler sees it.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveOutput<'a> {
    pub key: &'a str,
    pub ty: SocketType,
}

/// The instance's own input map, or the registry declaration when it has none.
pub fn effective_inputs<'a>(node: &'a Node, def: &'a NodeDefinition) -> Vec<EffectiveInput<'a>> {
    if !node.inputs.is_empty() {
        return node
            .inputs
            .iter()
            .map(|s| EffectiveInput {
                key: &s.key,
                ty: s.ty,
                connection: s.connection.as_ref(),
            })
            .collect();
    }
    def.inputs
        .iter()
        .map(|s| EffectiveInput {
            key: &s.key,
            ty: s.ty,
            connection: None,
        })
        .collect()
}

/// The instance's own output map, or the registry declaration when it has none.
pub fn effective_outputs<'a>(
    node: &'a Node,
    def: &'a NodeDefinition,
) -> Vec<EffectiveOutput<'a>> {
    if !node.outputs.is_empty() {
        return node
            .outputs
            .iter()
            .map(|s| EffectiveOutput { key: &s.key, ty: s.ty })
            .collect();
    }
    def.outputs
        .iter()
        .map(|s| EffectiveOutput { key: &s.key, ty: s.ty })
        .collect()
}

impl Node {
    /// Create an instance with socket maps materialised from `def`.
    pub fn from_definition(id: impl Into<String>, def: &NodeDefinition) -> Self {
        let mut node = Node::new(id, def.node_type.clone());
        node.inputs = def
            .inputs
            .iter()
            .map(|s| crate::dsl::InputSlot {
                key: s.key.clone(),
                ty: s.ty,
                label: s.label.clone(),
                connection: None,
            })
            .collect();
        node.outputs = def
            .outputs
            .iter()
            .map(|s| crate::dsl::OutputSlot {
                key: s.key.clone(),
                ty: s.ty,
                label: s.label.clone(),
            })
            .collect();
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::InputSlot;

    fn noop(ctx: &GenContext<'_>) -> NodeCode {
        let mut code = NodeCode::new();
        code.declare(ctx, "out", SocketType::Float, "1.0");
        code
    }

    fn def() -> NodeDefinition {
        NodeDefinition::new("Thing", "Test", noop)
            .input("a", SocketType::Float, "A")
            .input("b", SocketType::Vec2, "B")
            .output("out", SocketType::Float, "Out")
    }

    #[test]
    fn registry_lookup_and_replace() {
        let mut registry = NodeRegistry::new();
        assert!(registry.lookup("Thing").is_none());
        registry.register(def());
        registry.register(def().output("extra", SocketType::Vec3, "Extra"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("Thing").unwrap().outputs.len(), 2);
    }

    #[test]
    fn falls_back_to_registry_sockets_only_when_instance_has_none() {
        let d = def();
        let bare = Node::new("n1", "Thing");
        let keys: Vec<&str> = effective_inputs(&bare, &d).iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["a", "b"]);

        let mut custom = Node::new("n2", "Thing");
        custom.inputs.push(InputSlot {
            key: "z".into(),
            ty: SocketType::Vec3,
            label: "Z".into(),
            connection: None,
        });
        let inputs = effective_inputs(&custom, &d);
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].key, "z");
        assert_eq!(inputs[0].ty, SocketType::Vec3);
        assert_eq!(effective_outputs(&custom, &d)[0].key, "out");
    }

    #[test]
    fn from_definition_materialises_sockets() {
        let node = Node::from_definition("n", &def());
        assert_eq!(node.inputs.len(), 2);
        assert_eq!(node.outputs[0].key, "out");
        assert!(node.inputs.iter().all(|s| s.connection.is_none()));
    }

    #[test]
    fn builtin_registry_has_the_catalog() {
        let registry = NodeRegistry::builtin();
        for ty in ["UV", "Sin", "Output", "OutputRgba", "Loop", "SmoothMin", "Expr"] {
            assert!(registry.contains(ty), "{ty} missing");
        }
        assert_eq!(registry.lookup("Loop").unwrap().kind, NodeKind::Loop);
    }
}
