use std::path::PathBuf;

use serde_json::json;
use shader_graph_compiler::dsl::{self, InputSlot, Node, ShaderGraph};
use shader_graph_compiler::{
    CompileError, CompileTarget, CompiledShader, Compiler, CompilerConfig, Diagnostic,
    NodeRegistry, compile, validation,
};

fn case_path(case_name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("cases")
        .join(format!("{case_name}.json"))
}

fn load_case(case_name: &str) -> ShaderGraph {
    dsl::load_graph_from_path(case_path(case_name))
        .unwrap_or_else(|e| panic!("failed to load case {case_name}: {e:#}"))
}

fn compile_case(case_name: &str, target: CompileTarget, config: &CompilerConfig) -> CompiledShader {
    let graph = load_case(case_name);
    compile(&graph, &NodeRegistry::builtin(), config, &target)
        .unwrap_or_else(|e| panic!("case {case_name} failed to compile: {e}"))
}

fn line_index(source: &str, needle: &str) -> usize {
    source
        .lines()
        .position(|l| l.contains(needle))
        .unwrap_or_else(|| panic!("`{needle}` not found in:\n{source}"))
}

#[test]
fn simple_chain_orders_statements_and_broadcasts_at_output() {
    let shader = compile_case("simple_chain", CompileTarget::FullGraph, &CompilerConfig::default());
    let src = &shader.fragment_source;

    let uv = line_index(src, "vec2 uv1_uv = vUv;");
    let sin = line_index(src, "float sin1_out = sin(uv1_u * 2.0);");
    let out = line_index(src, "vec3 out_color = vec3(sin1_out);");
    let write = line_index(src, "gl_FragColor = vec4(out_color, 1.0);");
    assert!(uv < sin && sin < out && out < write, "{src}");
    assert_eq!(src.matches("gl_FragColor =").count(), 1);

    assert!(src.starts_with("precision highp float;\n"));
    assert!(line_index(src, "varying vec2 vUv;") < line_index(src, "void main() {"));
    assert_eq!(shader.variables["uv1"]["u"], "uv1_u");
    assert_eq!(shader.variables["out"]["color"], "out_color");
}

#[test]
fn shared_helpers_are_emitted_once() {
    let shader = compile_case("shared_helpers", CompileTarget::FullGraph, &CompilerConfig::default());
    let src = &shader.fragment_source;

    assert_eq!(src.matches("float smin(float a, float b, float k)").count(), 1);
    assert_eq!(src.matches("float smax(float a, float b, float k)").count(), 1);
    assert_eq!(src.matches("smin(").count(), 3, "definition plus two call sites");
    assert_eq!(src.matches("smax(").count(), 2, "definition plus one call site");
    // Helpers come before main().
    assert!(line_index(src, "float smax(") < line_index(src, "void main() {"));
    // The unconnected Noise node contributes nothing.
    assert!(!src.contains("hash22"));
    assert!(!shader.variables.contains_key("stray"));
}

#[test]
fn preview_compiles_a_node_the_output_never_sees() {
    let config = CompilerConfig::default();
    let full = compile_case("preview_isolation", CompileTarget::FullGraph, &config);
    assert!(!full.fragment_source.contains("b_value"));
    assert!(!full.fragment_source.contains("fbm"));
    assert!(full.fragment_source.contains("gl_FragColor = vec4(out_color, 1.0);"));

    let preview = compile_case(
        "preview_isolation",
        CompileTarget::PreviewNode("b".into()),
        &config,
    );
    let src = &preview.fragment_source;
    assert!(src.contains("float b_value = 0.5 + 0.5 * fbm(uv2_uv * 3.0, 4, 0.5);"));
    assert!(src.contains("gl_FragColor = vec4(vec3(b_value), 1.0);"));
    assert!(!src.contains("out_color"));
    assert!(!src.contains("time1_time"));
    assert_eq!(
        preview.variables.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["b", "uv2"]
    );
}

#[test]
fn dangling_loop_step_degrades_to_zero() {
    let shader = compile_case("dangling_loop_step", CompileTarget::FullGraph, &CompilerConfig::default());
    assert!(shader.fragment_source.contains("float loop1_result = 0.0;"));
    assert!(shader.fragment_source.contains("vec3 out_color = vec3(loop1_result);"));
    assert_eq!(
        shader.diagnostics,
        vec![Diagnostic::MissingLoopStep {
            loop_node_id: "loop1".into(),
            missing_step_id: "x1".into()
        }]
    );
}

#[test]
fn loop_chain_unrolls_and_feeds_the_expression() {
    let shader = compile_case("loop_chain", CompileTarget::FullGraph, &CompilerConfig::default());
    let src = &shader.fragment_source;
    let expected = [
        "float loop1_i0_s1_out = uv1_u * 2.0;",
        "float loop1_i0_s2_out = fract(loop1_i0_s1_out);",
        "float loop1_i1_s1_out = loop1_i0_s2_out * 2.0;",
        "float loop1_i1_s2_out = fract(loop1_i1_s1_out);",
        "float loop1_i2_s1_out = loop1_i1_s2_out * 2.0;",
        "float loop1_i2_s2_out = fract(loop1_i2_s1_out);",
        "float loop1_result = loop1_i2_s2_out;",
        "float e1_out = loop1_result * loop1_result + uv1_v;",
    ];
    let mut last = 0;
    for line in expected {
        let at = line_index(src, line);
        assert!(at >= last, "`{line}` out of order in:\n{src}");
        last = at;
    }
    // Step nodes are only compiled inside the loop.
    assert!(!src.contains("float s1_out"));
    assert!(!src.contains("float s2_out"));
}

#[test]
fn compiling_twice_is_byte_identical() {
    let compiler = Compiler::new(
        NodeRegistry::builtin(),
        CompilerConfig {
            memoize: false,
            ..CompilerConfig::default()
        },
    );
    for case in ["simple_chain", "shared_helpers", "preview_isolation", "loop_chain"] {
        let graph = load_case(case);
        let a = compiler.compile(&graph, &CompileTarget::FullGraph).unwrap();
        let b = compiler.compile(&graph.clone(), &CompileTarget::FullGraph).unwrap();
        assert_eq!(a.fragment_source, b.fragment_source, "{case}");
    }
}

#[test]
fn cycles_abort_the_whole_compile() {
    let mut graph = load_case("simple_chain");
    // Feed the Sin back into its own frequency.
    let sin = graph.node_mut("sin1").unwrap();
    assert!(sin.connect("freq", "sin1", "out"));
    let err = compile(
        &graph,
        &NodeRegistry::builtin(),
        &CompilerConfig::default(),
        &CompileTarget::FullGraph,
    )
    .unwrap_err();
    assert_eq!(err, CompileError::CycleDetected { node_ids: vec!["sin1".into()] });
    assert!(err.to_string().starts_with("graph error: cycle detected"));
}

#[test]
fn unknown_node_types_fall_back_to_defaults() {
    let mut graph = load_case("simple_chain");
    graph.nodes.push(Node::new("legacy", "OldNoise"));
    assert!(graph.node_mut("sin1").unwrap().connect("phase", "legacy", "out"));

    let shader = compile(
        &graph,
        &NodeRegistry::builtin(),
        &CompilerConfig::default(),
        &CompileTarget::FullGraph,
    )
    .unwrap();
    assert!(shader.fragment_source.contains("float sin1_out = sin(uv1_u * 2.0);"));
    assert_eq!(
        shader.diagnostics,
        vec![Diagnostic::UnknownNodeType {
            node_id: "legacy".into(),
            node_type: "OldNoise".into()
        }]
    );
}

#[test]
fn rgba_output_writes_the_vec4_directly() {
    let registry = NodeRegistry::builtin();
    let mut out = Node::from_definition("o", registry.lookup("OutputRgba").unwrap());
    out.inputs[0].connection = None;
    let graph = ShaderGraph::new(vec![out]);
    let shader = compile(&graph, &registry, &CompilerConfig::default(), &CompileTarget::FullGraph).unwrap();
    assert!(shader.fragment_source.contains("vec4 o_color = vec4(0.0, 0.0, 0.0, 1.0);"));
    assert!(shader.fragment_source.contains("gl_FragColor = o_color;"));
}

#[test]
fn custom_function_helper_uses_instance_sockets() {
    let registry = NodeRegistry::builtin();
    let mut cf = Node::new("warp", "CustomFunction")
        .with_param("body", json!("vec2 q = p * 2.0;\nreturn q.x * q.y;"));
    cf.inputs.push(InputSlot {
        key: "p".into(),
        ty: shader_graph_compiler::types::SocketType::Vec2,
        label: "P".into(),
        connection: None,
    });
    assert!(cf.connect("p", "uv1", "uv"));
    let graph = ShaderGraph::new(vec![
        Node::from_definition("uv1", registry.lookup("UV").unwrap()),
        cf,
    ]);
    let shader = compile(
        &graph,
        &registry,
        &CompilerConfig::default(),
        &CompileTarget::PreviewNode("warp".into()),
    )
    .unwrap();
    let src = &shader.fragment_source;
    assert!(src.contains("float cf_warp(vec2 p) {\n    vec2 q = p * 2.0;\n    return q.x * q.y;\n}"));
    assert!(src.contains("float warp_out = cf_warp(uv1_uv);"));
}

#[test]
fn generated_glsl450_passes_naga_validation() {
    let config = CompilerConfig::glsl450();
    let cases = [
        ("simple_chain", CompileTarget::FullGraph),
        ("dangling_loop_step", CompileTarget::FullGraph),
        ("loop_chain", CompileTarget::FullGraph),
        ("preview_isolation", CompileTarget::PreviewNode("a".into())),
    ];
    for (case, target) in cases {
        let shader = compile_case(case, target, &config);
        assert!(shader.fragment_source.starts_with("#version 450\n"));
        validation::validate_glsl_fragment_with_context(&shader.fragment_source, case)
            .unwrap_or_else(|e| panic!("{e:#}"));
    }
}

#[test]
fn smooth_min_and_max_pass_naga_validation() {
    let registry = NodeRegistry::builtin();
    let node = |id: &str, ty: &str| Node::from_definition(id, registry.lookup(ty).unwrap());
    let mut graph = ShaderGraph::new(vec![
        node("uv1", "UV"),
        node("c1", "SdCircle"),
        node("c2", "SdCircle").with_param("center", json!([0.3, 0.6])),
        node("sm1", "SmoothMin"),
        node("sm2", "SmoothMin"),
        node("sx1", "SmoothMax"),
        node("fill1", "SdfFill"),
        node("out", "Output"),
    ]);
    let wires = [
        ("uv1", "uv", "c1", "p"),
        ("uv1", "uv", "c2", "p"),
        ("c1", "out", "sm1", "a"),
        ("c2", "out", "sm1", "b"),
        ("sm1", "out", "sm2", "a"),
        ("c2", "out", "sm2", "b"),
        ("sm2", "out", "sx1", "a"),
        ("c1", "out", "sx1", "b"),
        ("sx1", "out", "fill1", "d"),
        ("fill1", "mask", "out", "color"),
    ];
    for (from, from_out, to, to_in) in wires {
        assert!(graph.node_mut(to).unwrap().connect(to_in, from, from_out));
    }

    let shader = compile(&graph, &registry, &CompilerConfig::glsl450(), &CompileTarget::FullGraph).unwrap();
    assert_eq!(shader.fragment_source.matches("float smin(").count(), 1);
    assert_eq!(shader.fragment_source.matches("float smax(").count(), 1);
    validation::validate_glsl_fragment(&shader.fragment_source).unwrap_or_else(|e| panic!("{e:#}"));
}

#[test]
fn noise_family_shares_one_hash() {
    let shader = compile_case("noise_family", CompileTarget::FullGraph, &CompilerConfig::default());
    let src = &shader.fragment_source;

    for signature in [
        "vec2 hash22(vec2 p)",
        "float gradient_noise(vec2 p)",
        "float fbm(vec2 p, int octaves, float gain)",
        "vec2 voronoi(vec2 p)",
    ] {
        assert_eq!(src.matches(signature).count(), 1, "`{signature}` in:\n{src}");
    }
    // First use decides the order, and every helper precedes its callers.
    let hash = line_index(src, "vec2 hash22(vec2 p)");
    let gradient = line_index(src, "float gradient_noise(vec2 p)");
    let fbm = line_index(src, "float fbm(vec2 p");
    let voronoi = line_index(src, "vec2 voronoi(vec2 p)");
    assert!(hash < gradient && gradient < fbm && fbm < voronoi, "{src}");
    assert!(voronoi < line_index(src, "void main() {"));

    assert!(src.contains("vec2 vor1_cells = voronoi(uv1_uv * 6.0);"));
    assert!(src.contains("float add2_out = add1_out + vor1_distance;"));
}

#[test]
fn custom_functions_with_lookalike_ids_get_distinct_helpers() {
    let registry = NodeRegistry::builtin();
    let def = registry.lookup("CustomFunction").unwrap();
    let mut minus = Node::from_definition("f-1", def).with_param("body", json!("return a * 2.0;"));
    let mut under = Node::from_definition("f_1", def).with_param("body", json!("return a * 3.0;"));
    assert!(minus.connect("a", "uv1", "u"));
    assert!(under.connect("a", "uv1", "v"));
    let mut sum = Node::from_definition("sum", registry.lookup("Add").unwrap());
    assert!(sum.connect("a", "f-1", "out"));
    assert!(sum.connect("b", "f_1", "out"));
    let mut out = Node::from_definition("out", registry.lookup("Output").unwrap());
    assert!(out.connect("color", "sum", "out"));
    let graph = ShaderGraph::new(vec![
        Node::from_definition("uv1", registry.lookup("UV").unwrap()),
        minus,
        under,
        sum,
        out,
    ]);

    let shader = compile(&graph, &registry, &CompilerConfig::default(), &CompileTarget::FullGraph).unwrap();
    let src = &shader.fragment_source;
    assert!(src.contains("float cf_f_1(float a, float b) {\n    return a * 2.0;\n}"), "{src}");
    assert!(src.contains("float cf_f_1_1(float a, float b) {\n    return a * 3.0;\n}"), "{src}");
    assert!(src.contains("float f_1_out = cf_f_1(uv1_u, 0.0);"));
    assert!(src.contains("float f_1_1_out = cf_f_1_1(uv1_v, 0.0);"));
    assert!(src.contains("float sum_out = f_1_out + f_1_1_out;"));
    assert_eq!(shader.variables["f-1"]["out"], "f_1_out");
    assert_eq!(shader.variables["f_1"]["out"], "f_1_1_out");
}
