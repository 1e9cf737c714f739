//! Walks a schedule and turns each node into GLSL statements.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use super::loop_expand;
use crate::config::CompilerConfig;
use crate::dsl::{Node, ShaderGraph};
use crate::error::{CompileError, Diagnostic};
use crate::node_compiler::{GenContext, NodeCode};
use crate::schema::{NodeDefinition, NodeKind, NodeRegistry, effective_inputs, effective_outputs};
use crate::types::{SocketType, TypedExpr, is_compatible};
use crate::utils::{sanitize_glsl_ident, var_name};

/// Helper blocks keyed by their exact text, kept in first-use order.
#[derive(Debug, Clone, Default)]
pub struct HelperSet {
    blocks: Vec<String>,
    seen: HashSet<String>,
}

impl HelperSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block unless an identical one is already present. Blank text is ignored.
    pub fn insert(&mut self, text: &str) -> bool {
        if text.trim().is_empty() || self.seen.contains(text) {
            return false;
        }
        self.seen.insert(text.to_string());
        self.blocks.push(text.to_string());
        true
    }

    pub fn contains(&self, text: &str) -> bool {
        self.seen.contains(text)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// GLSL names handed out during one compile.
///
/// Sanitizing node ids is lossy (`n-1` and `n_1` both become `n_1`), and a loop
/// may list the same step twice, so every prefix is checked against what is
/// already declared and bumped with a numeric suffix until it is free.
#[derive(Debug, Default)]
pub(crate) struct NameTable {
    prefixes: HashSet<String>,
    vars: HashSet<String>,
    symbols: HashMap<String, String>,
    symbol_names: HashSet<String>,
}

impl NameTable {
    /// Claim a variable prefix for an instance declaring `keys`.
    pub(crate) fn claim_prefix(&mut self, base: &str, keys: &[String]) -> String {
        let base = sanitize_glsl_ident(base);
        let mut candidate = base.clone();
        let mut n = 1;
        while self.prefixes.contains(&candidate)
            || keys.iter().any(|k| self.vars.contains(&var_name(&candidate, k)))
        {
            candidate = sanitize_glsl_ident(&format!("{base}_{n}"));
            n += 1;
        }
        self.vars.extend(keys.iter().map(|k| var_name(&candidate, k)));
        self.prefixes.insert(candidate.clone());
        candidate
    }

    /// Record what a generator actually declared, temporaries included.
    pub(crate) fn record(&mut self, code: &NodeCode) {
        self.vars.extend(code.outputs.iter().map(|(_, v)| v.expr.clone()));
        for line in code.code.lines() {
            let mut words = line.split_whitespace();
            if let (Some(ty), Some(name), Some("=")) = (words.next(), words.next(), words.next()) {
                if SocketType::parse(ty).is_some() {
                    self.vars.insert(name.to_string());
                }
            }
        }
    }

    /// Per-node name shared by every instance of `node_id`, distinct across nodes.
    pub(crate) fn symbol(&mut self, node_id: &str) -> String {
        if let Some(s) = self.symbols.get(node_id) {
            return s.clone();
        }
        // Symbols get glued behind `cf_` and similar stems; a leading `_` would
        // form a reserved double underscore.
        let mut base = sanitize_glsl_ident(node_id);
        if base.starts_with('_') {
            base.insert(0, 'n');
        }
        let mut candidate = base.clone();
        let mut n = 1;
        while self.symbol_names.contains(&candidate) {
            candidate = sanitize_glsl_ident(&format!("{base}_{n}"));
            n += 1;
        }
        self.symbol_names.insert(candidate.clone());
        self.symbols.insert(node_id.to_string(), candidate.clone());
        candidate
    }
}

/// Every key `node` may declare: its instance outputs and the definition's.
pub(crate) fn output_keys(node: &Node, def: &NodeDefinition) -> Vec<String> {
    let mut keys: Vec<String> = effective_outputs(node, def)
        .iter()
        .map(|o| o.key.to_string())
        .collect();
    for o in &def.outputs {
        if !keys.contains(&o.key) {
            keys.push(o.key.clone());
        }
    }
    keys
}

/// Everything the assembler needs from code generation.
#[derive(Debug, Clone, Default)]
pub struct GeneratedCode {
    /// One block per node, in schedule order.
    pub statements: Vec<String>,
    pub helpers: HelperSet,
    /// Node id -> output key -> typed variable, in declaration order.
    pub outputs: HashMap<String, Vec<(String, TypedExpr)>>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Codegen<'a> {
    pub(crate) index: HashMap<&'a str, &'a Node>,
    pub(crate) registry: &'a NodeRegistry,
    pub(crate) config: &'a CompilerConfig,
    pub(crate) names: NameTable,
    out: GeneratedCode,
}

impl<'a> Codegen<'a> {
    pub fn new(graph: &'a ShaderGraph, registry: &'a NodeRegistry, config: &'a CompilerConfig) -> Self {
        Self {
            index: graph.nodes_by_id(),
            registry,
            config,
            names: NameTable::default(),
            out: GeneratedCode::default(),
        }
    }

    /// Generate code for `order`, which must list every node after its sources.
    pub fn run(mut self, order: &[String]) -> Result<GeneratedCode, CompileError> {
        for id in order {
            let Some(&node) = self.index.get(id.as_str()) else {
                continue;
            };
            self.emit_node(node)?;
        }
        Ok(self.out)
    }

    fn emit_node(&mut self, node: &'a Node) -> Result<(), CompileError> {
        let registry = self.registry;
        // Unknown types were already reported by the scheduler.
        let Some(def) = registry.lookup(&node.node_type) else {
            return Ok(());
        };
        let resolved = self.resolve_inputs(node, def)?;
        let prefix = self.names.claim_prefix(&node.id, &output_keys(node, def));
        let code = match def.kind {
            NodeKind::Loop => loop_expand::expand_loop(self, node, def, &prefix, resolved)?,
            NodeKind::Plain | NodeKind::Output { .. } => {
                let symbol = self.names.symbol(&node.id);
                let ctx = GenContext::new(node, def, prefix, resolved).with_symbol(symbol);
                invoke(def, &ctx)
            }
        };
        self.names.record(&code);
        trace!(node_id = %node.id, outputs = code.outputs.len(), "generated node");

        if !code.code.is_empty() {
            self.out.statements.push(code.code);
        }
        for helper in &code.helpers {
            self.out.helpers.insert(helper);
        }
        push_diagnostics(&mut self.out.diagnostics, code.diagnostics);
        self.out.outputs.insert(node.id.clone(), code.outputs);
        Ok(())
    }

    /// Look up the recorded variable behind each connected input.
    ///
    /// Inputs whose source was never generated (dangling reference, unknown
    /// type, undeclared output key) are left out and fall back to defaults.
    pub(crate) fn resolve_inputs(
        &self,
        node: &Node,
        def: &NodeDefinition,
    ) -> Result<HashMap<String, TypedExpr>, CompileError> {
        let mut resolved = HashMap::new();
        for input in effective_inputs(node, def) {
            let Some(conn) = input.connection else {
                continue;
            };
            let Some(source) = self
                .out
                .outputs
                .get(&conn.node_id)
                .and_then(|outs| outs.iter().find(|(k, _)| *k == conn.output_key))
                .map(|(_, v)| v)
            else {
                continue;
            };
            if !is_compatible(source.ty, input.ty) {
                return Err(CompileError::IncompatibleConnection {
                    from_node: conn.node_id.clone(),
                    from_output: conn.output_key.clone(),
                    from_ty: source.ty,
                    to_node: node.id.clone(),
                    to_input: input.key.to_string(),
                    to_ty: input.ty,
                });
            }
            resolved.insert(input.key.to_string(), source.clone());
        }
        Ok(resolved)
    }
}

/// Run a generator and put the definition's shared helpers ahead of its own.
pub(crate) fn invoke(def: &NodeDefinition, ctx: &GenContext<'_>) -> NodeCode {
    let mut code = (def.generate)(ctx);
    let mut helpers: Vec<String> = def.glsl_functions.iter().map(|s| s.to_string()).collect();
    helpers.append(&mut code.helpers);
    code.helpers = helpers;
    code
}

pub(crate) fn push_diagnostics(into: &mut Vec<Diagnostic>, from: Vec<Diagnostic>) {
    for d in from {
        if !into.contains(&d) {
            into.push(d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_compiler::sdf_nodes::{SMAX_GLSL, SMIN_GLSL};
    use crate::node_compiler::test_utils::{test_connection, test_node};
    use crate::types::SocketType;

    fn run(graph: &ShaderGraph, order: &[&str]) -> Result<GeneratedCode, CompileError> {
        let registry = NodeRegistry::builtin();
        let config = CompilerConfig::default();
        let order: Vec<String> = order.iter().map(|s| s.to_string()).collect();
        Codegen::new(graph, &registry, &config).run(&order)
    }

    #[test]
    fn helper_set_dedups_by_exact_text() {
        let mut set = HelperSet::new();
        assert!(set.insert("float f() { return 1.0; }"));
        assert!(!set.insert("float f() { return 1.0; }"));
        assert!(set.insert("float g() { return 1.0; }"));
        assert!(!set.insert("   "));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().next(), Some("float f() { return 1.0; }"));
    }

    #[test]
    fn wired_inputs_read_upstream_variables() {
        let registry = NodeRegistry::builtin();
        let mut graph = ShaderGraph::new(vec![
            test_node(&registry, "uv1", "UV"),
            test_node(&registry, "sin1", "Sin"),
        ]);
        test_connection(&mut graph, "uv1", "u", "sin1", "x");
        let out = run(&graph, &["uv1", "sin1"]).unwrap();
        assert_eq!(out.statements[1], "float sin1_out = sin(uv1_u * 1.0);");
        assert_eq!(
            out.outputs["sin1"],
            vec![("out".to_string(), TypedExpr::new("sin1_out", SocketType::Float))]
        );
    }

    #[test]
    fn shared_helpers_are_emitted_once() {
        let registry = NodeRegistry::builtin();
        let graph = ShaderGraph::new(vec![
            test_node(&registry, "a", "SmoothMin"),
            test_node(&registry, "b", "SmoothMin"),
            test_node(&registry, "c", "SmoothMax"),
        ]);
        let out = run(&graph, &["a", "b", "c"]).unwrap();
        let helpers: Vec<&str> = out.helpers.iter().collect();
        assert_eq!(helpers, vec![SMIN_GLSL, SMAX_GLSL]);
    }

    #[test]
    fn incompatible_connections_are_internal_errors() {
        let registry = NodeRegistry::builtin();
        let mut graph = ShaderGraph::new(vec![
            test_node(&registry, "uv1", "UV"),
            test_node(&registry, "sin1", "Sin"),
        ]);
        test_connection(&mut graph, "uv1", "uv", "sin1", "x");
        let err = run(&graph, &["uv1", "sin1"]).unwrap_err();
        assert_eq!(
            err,
            CompileError::IncompatibleConnection {
                from_node: "uv1".into(),
                from_output: "uv".into(),
                from_ty: SocketType::Vec2,
                to_node: "sin1".into(),
                to_input: "x".into(),
                to_ty: SocketType::Float,
            }
        );
    }

    #[test]
    fn undeclared_output_keys_fall_back_to_defaults() {
        let registry = NodeRegistry::builtin();
        let mut graph = ShaderGraph::new(vec![
            test_node(&registry, "uv1", "UV"),
            test_node(&registry, "sin1", "Sin"),
        ]);
        test_connection(&mut graph, "uv1", "w", "sin1", "x");
        let out = run(&graph, &["uv1", "sin1"]).unwrap();
        assert_eq!(out.statements[1], "float sin1_out = sin(0.0 * 1.0);");
    }

    #[test]
    fn ids_that_sanitize_alike_get_distinct_variables() {
        let registry = NodeRegistry::builtin();
        let mut graph = ShaderGraph::new(vec![
            test_node(&registry, "n-1", "Float").with_param("value", serde_json::json!(2.0)),
            test_node(&registry, "n_1", "Float"),
            test_node(&registry, "sum", "Add"),
        ]);
        test_connection(&mut graph, "n-1", "value", "sum", "a");
        test_connection(&mut graph, "n_1", "value", "sum", "b");
        let out = run(&graph, &["n-1", "n_1", "sum"]).unwrap();
        assert_eq!(
            out.statements,
            vec![
                "float n_1_value = 2.0;",
                "float n_1_1_value = 0.0;",
                "float sum_out = n_1_value + n_1_1_value;",
            ]
        );
        assert_eq!(out.outputs["n-1"][0].1.expr, "n_1_value");
        assert_eq!(out.outputs["n_1"][0].1.expr, "n_1_1_value");
    }

    #[test]
    fn name_table_checks_whole_variable_names() {
        let mut names = NameTable::default();
        assert_eq!(names.claim_prefix("a_b", &["c".to_string()]), "a_b");
        // `a` + `b_c` would spell `a_b_c` again.
        assert_eq!(names.claim_prefix("a", &["b_c".to_string()]), "a_1");
        assert_eq!(names.claim_prefix("a_b", &[]), "a_b_1");
    }

    #[test]
    fn symbols_are_stable_per_node_and_distinct_across_nodes() {
        let mut names = NameTable::default();
        assert_eq!(names.symbol("f-1"), "f_1");
        assert_eq!(names.symbol("f_1"), "f_1_1");
        assert_eq!(names.symbol("f-1"), "f_1");
        assert_eq!(names.symbol("_x"), "n_x");
    }
}
