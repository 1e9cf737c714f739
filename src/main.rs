use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use shader_graph_compiler::{
    CompileTarget, CompilerConfig, NodeRegistry, ShaderPrologue, compile, config, dsl, validation,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Clone)]
struct Cli {
    graph: Option<PathBuf>,
    preview: Option<String>,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    validate: bool,
}

const USAGE: &str =
    "supported: --graph <graph.json>, --preview <nodeId>, --config <config.json>, --out <file>, --validate";

fn parse_cli(args: &[String]) -> Result<Cli> {
    let mut cli = Cli::default();
    let mut i = 0;
    while i < args.len() {
        let value = |name: &str| {
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| anyhow!("missing value for {name}"))
        };
        match args[i].as_str() {
            "--graph" => {
                cli.graph = Some(PathBuf::from(value("--graph")?));
                i += 2;
            }
            "--preview" => {
                cli.preview = Some(value("--preview")?);
                i += 2;
            }
            "--config" => {
                cli.config = Some(PathBuf::from(value("--config")?));
                i += 2;
            }
            "--out" => {
                cli.out = Some(PathBuf::from(value("--out")?));
                i += 2;
            }
            "--validate" => {
                cli.validate = true;
                i += 1;
            }
            other => bail!("unknown argument: {other} ({USAGE})"),
        }
    }
    Ok(cli)
}

fn main() -> Result<()> {
    // stdout carries the shader; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&argv)?;
    let Some(graph_path) = cli.graph.as_deref() else {
        bail!("--graph is required ({USAGE})");
    };

    let graph = dsl::load_graph_from_path(graph_path)?;
    let mut cfg = match cli.config.as_deref() {
        Some(path) => config::load_config_from_path(path)?,
        None => CompilerConfig::default(),
    };
    if cli.validate {
        // naga only reads desktop GLSL.
        cfg.prologue = ShaderPrologue::glsl450();
    }
    let target = match cli.preview {
        Some(id) => CompileTarget::PreviewNode(id),
        None => CompileTarget::FullGraph,
    };

    let registry = NodeRegistry::builtin();
    let shader = compile(&graph, &registry, &cfg, &target)
        .map_err(|e| anyhow!("shader did not compile, {e}"))?;
    for d in &shader.diagnostics {
        warn!(node_id = d.node_id(), "{d}");
    }

    if cli.validate {
        validation::validate_glsl_fragment_with_context(
            &shader.fragment_source,
            &graph_path.display().to_string(),
        )?;
        info!("naga validation passed");
    }

    match cli.out {
        Some(path) => {
            std::fs::write(&path, &shader.fragment_source)
                .with_context(|| format!("failed to write shader to {}", path.display()))?;
            info!(path = %path.display(), "wrote fragment shader");
        }
        None => print!("{}", shader.fragment_source),
    }
    Ok(())
}
