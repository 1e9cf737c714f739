//! Compiles shader node graphs into GLSL fragment shaders.

pub mod compiler;
pub mod config;
pub mod dsl;
pub mod error;
pub mod expr;
pub mod graph;
pub mod node_compiler;
pub mod schema;
pub mod types;
pub mod utils;
pub mod validation;

pub use compiler::{CompileTarget, CompiledShader, Compiler, compile};
pub use config::{CompilerConfig, ShaderPrologue};
pub use dsl::ShaderGraph;
pub use error::{CompileError, Diagnostic};
pub use schema::NodeRegistry;
