use blocklang::{
	BlockContext, BlockElaborator, ElabConfig, Environment, NodeId, ProvidesCompilerDiagnostic, SyntaxTree, Value,
};
use hgen::{Design, DesignError, DumpError, GeneratorHandle, StmtId};
use log::{debug, info};
use miette::Diagnostic;
use serde::Deserialize;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum DriverError {
	#[error(transparent)]
	#[diagnostic(code(blockc::io_error))]
	IoError(#[from] std::io::Error),

	#[error("Malformed block description: {0}")]
	#[diagnostic(
		code(blockc::input),
		help("The input must be a JSON object with file, line, generator, tree and function fields.")
	)]
	InputError(#[from] serde_json::Error),

	#[error(transparent)]
	#[diagnostic(code(blockc::generator))]
	GeneratorError(#[from] DesignError),

	#[error(transparent)]
	#[diagnostic(code(blockc::dump))]
	DumpError(#[from] DumpError),
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
	Input,
	Output,
	#[default]
	Internal,
}

/// Generator variable visible to the block
#[derive(Clone, Debug, Deserialize)]
pub struct VarDesc {
	pub name: String,
	pub width: u32,
	#[serde(default)]
	pub signed: bool,
	#[serde(default)]
	pub direction: Direction,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GeneratorDesc {
	pub name: String,
	#[serde(default)]
	pub vars: Vec<VarDesc>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
	#[default]
	Block,
	Function,
}

/// Block handed over by the host-language frontend
#[derive(Clone, Debug, Deserialize)]
pub struct BlockDesc {
	/// Source file the block is defined in
	pub file: String,

	/// Line of the function definition
	pub line: u32,

	pub generator: GeneratorDesc,

	/// Host values visible to the block (in addition to generator variables)
	#[serde(default)]
	pub env: Environment,

	/// Host locals attached to assignments when capturing is enabled
	#[serde(default)]
	pub locals: Vec<(String, Value)>,

	pub tree: SyntaxTree,
	pub function: NodeId,

	#[serde(default)]
	pub kind: BlockKind,

	/// (width, signed) of function arguments
	#[serde(default)]
	pub arg_types: Vec<(u32, bool)>,
}

#[derive(Clone, Debug, Default)]
pub struct DriverOptions {
	pub elab: ElabConfig,
	pub capture_locals: bool,
}

fn build_generator(design: &Design, desc: &GeneratorDesc) -> Result<GeneratorHandle, DesignError> {
	let generator = design.new_generator(&desc.name)?;
	for var in &desc.vars {
		match var.direction {
			Direction::Input => generator.input(&var.name, var.width, var.signed)?,
			Direction::Output => generator.output(&var.name, var.width, var.signed)?,
			Direction::Internal => generator.var(&var.name, var.width, var.signed)?,
		};
	}
	debug!("Generator '{}' has {} variables", desc.name, desc.vars.len());
	Ok(generator)
}

fn write_statements(
	design: &Design,
	stmts: &[StmtId],
	show_metadata: bool,
	output: &mut dyn Write,
) -> Result<(), DriverError> {
	let text = hgen::dump_statements(design, stmts, show_metadata)?;
	output.write_all(text.as_bytes())?;
	Ok(())
}

/// Elaborates a JSON block description and writes the generated statements
pub fn compile(source: &str, output: &mut dyn Write, options: &DriverOptions) -> miette::Result<()> {
	let desc: BlockDesc = serde_json::from_str(source).map_err(DriverError::from)?;
	info!("Loaded block from {}:{} ({} nodes)", desc.file, desc.line, desc.tree.len());

	let design = Design::new();
	let generator = build_generator(&design, &desc.generator).map_err(DriverError::from)?;

	let mut env = Environment::new();
	env.bind_generator_vars(&generator);
	for (name, value) in desc.env.iter() {
		env.bind(name, value.clone());
	}

	let mut block = BlockContext::new(&desc.file, desc.line);
	if options.capture_locals {
		block = block.with_captured_locals(desc.locals.clone());
	}

	let show_metadata = options.elab.debug;
	let elaborator = BlockElaborator::new(options.elab.clone());
	match desc.kind {
		BlockKind::Block => {
			let result = elaborator
				.elaborate_block(&generator, &desc.tree, desc.function, &env, &block)
				.map_err(|err| err.to_miette_report())?;

			writeln!(output, "{} block", result.block_type).map_err(DriverError::from)?;
			for entry in &result.sensitivity {
				writeln!(output, "{} {}", entry.edge, entry.signal).map_err(DriverError::from)?;
			}
			write_statements(&design, &result.statements, show_metadata, output)?;
		},
		BlockKind::Function => {
			let result = elaborator
				.elaborate_function(&generator, &desc.tree, desc.function, &env, &block, &desc.arg_types)
				.map_err(|err| err.to_miette_report())?;

			let name = design
				.get_function(result.function)
				.map(|f| f.name)
				.unwrap_or_default();
			let args: Vec<&str> = result.arg_order.values().map(|s| s.as_str()).collect();
			writeln!(output, "function {}({})", name, args.join(", ")).map_err(DriverError::from)?;
			write_statements(&design, &result.statements, show_metadata, output)?;
		},
	}

	Ok(())
}
