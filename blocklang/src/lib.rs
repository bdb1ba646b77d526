pub mod core;
pub mod elab;
pub mod eval;
pub mod syntax;

pub use crate::core::{CompilerDiagnostic, ProvidesCompilerDiagnostic};
pub use elab::{
	BlockContext, BlockElaborator, BlockType, EdgeKind, ElabConfig, ElabError, ElabErrorKind, ElabResult, FunctionResult,
	SensitivityEntry,
};
pub use eval::{Environment, Value};
pub use syntax::{NodeId, SyntaxTree};
