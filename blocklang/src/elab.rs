mod classifier;
mod elab_error;
mod executor;
mod normalizer;
mod rewriter;
mod scope;
mod static_elab;

pub use classifier::{BlockType, EdgeKind, SensitivityEntry};
pub use elab_error::{ElabError, ElabErrorKind, SyntaxRestriction};
pub use scope::{FunctionScope, IfHandle, Scope, StatementScope};

use crate::eval::{generator_namespace, CompileTimeEvalError, Environment, Interpreter, Value};
use crate::syntax::{NodeId, NodeKind, SyntaxTree};
use hgen::{FunctionId, GeneratorHandle, SourceRef, StmtId};
use log::{error, info};
use static_elab::Provenance;
use std::collections::BTreeMap;

/// Elaborator settings
#[derive(Clone, Debug)]
pub struct ElabConfig {
	/// Attach source lines and loop variables to generated statements
	pub debug: bool,

	/// Upper bound on the number of iterations of a single loop
	pub max_loop_iterations: usize,

	/// Reject blocks without a decoration instead of treating them as combinational
	pub require_decoration: bool,
}

impl Default for ElabConfig {
	fn default() -> Self {
		Self {
			debug: false,
			max_loop_iterations: 65536,
			require_decoration: false,
		}
	}
}

/// Where the block comes from and what host values it can see
#[derive(Clone, Debug, Default)]
pub struct BlockContext {
	pub filename: String,

	/// Line of the function definition in the file
	pub start_line: u32,

	/// Host-language locals attached to every assignment (if any)
	pub captured_locals: Option<Vec<(String, Value)>>,
}

impl BlockContext {
	pub fn new(filename: &str, start_line: u32) -> Self {
		Self {
			filename: filename.into(),
			start_line,
			captured_locals: None,
		}
	}

	pub fn with_captured_locals(mut self, locals: Vec<(String, Value)>) -> Self {
		self.captured_locals = Some(locals);
		self
	}
}

/// Elaborated statement block
#[derive(Clone, Debug)]
pub struct ElabResult {
	pub block_type: BlockType,
	pub sensitivity: Vec<SensitivityEntry>,

	/// Top-level statements in source order
	pub statements: Vec<StmtId>,
}

/// Elaborated function block
#[derive(Clone, Debug)]
pub struct FunctionResult {
	pub function: FunctionId,

	/// Argument names by position (`self` excluded)
	pub arg_order: BTreeMap<usize, String>,

	pub statements: Vec<StmtId>,
}

/// State shared by all elaboration passes over a single block.
/// Passes are implemented in the submodules.
struct BlockElabCtx<'a> {
	/// Working copy of the tree; rewrites add nodes to it
	tree: SyntaxTree,
	env: Environment,
	config: &'a ElabConfig,
	filename: String,
	start_line: u32,

	/// Bindings of the loops currently being unrolled
	provenance: Provenance,
	is_function: bool,
}

impl<'a> BlockElabCtx<'a> {
	fn new(tree: &SyntaxTree, env: Environment, config: &'a ElabConfig, block: &BlockContext, is_function: bool) -> Self {
		Self {
			tree: tree.clone(),
			env,
			config,
			filename: block.filename.clone(),
			start_line: block.start_line,
			provenance: vec![],
			is_function,
		}
	}

	/// Line in the source file. The function definition is at line 1 of the tree.
	fn abs_line(&self, node: NodeId) -> u32 {
		self.start_line + self.tree.loc(node).line.saturating_sub(1)
	}

	fn location(&self, line: u32) -> SourceRef {
		SourceRef::new(&self.filename, line)
	}

	fn source_ref(&self, node: NodeId) -> SourceRef {
		self.location(self.abs_line(node))
	}

	fn error_at(&self, node: NodeId, err: impl Into<ElabErrorKind>) -> ElabError {
		ElabError::new(err.into()).at(self.source_ref(node))
	}

	fn interpreter(&self) -> Interpreter<'_> {
		Interpreter::probe(&self.tree, &self.env).with_sequence_limit(self.config.max_loop_iterations)
	}

	/// Evaluates an expression without constructing any hardware
	fn probe(&self, node: NodeId) -> Result<Value, ElabError> {
		self.interpreter().eval(node).map_err(|err| self.error_at(node, err))
	}

	/// Unrolls, prunes and rewrites the body into scope calls
	fn rewrite(&mut self, body: &[NodeId]) -> Result<Vec<normalizer::ScopeCall>, ElabError> {
		let stmts = self.elab_body(body)?;
		self.normalize_block(stmts)
	}
}

/// Parts of a function definition
struct FunctionDef {
	name: String,
	params: Vec<String>,
	decorators: Vec<NodeId>,
	body: Vec<NodeId>,
}

fn function_def(tree: &SyntaxTree, function: NodeId) -> Result<FunctionDef, ElabError> {
	tree.validate()?;
	let node = tree
		.get(function)
		.ok_or_else(|| ElabError::from(crate::syntax::TreeError::NoSuchNode(function)))?;

	match &node.kind {
		NodeKind::FunctionDef {
			name,
			params,
			decorators,
			body,
		} => Ok(FunctionDef {
			name: name.clone(),
			params: params.clone(),
			decorators: decorators.clone(),
			body: body.clone(),
		}),
		_ => Err(SyntaxRestriction::NotAFunction.into()),
	}
}

/// Reads a single line of a source file (if it is available)
fn source_line(filename: &str, line: u32) -> Option<String> {
	let index = line.checked_sub(1)? as usize;
	let source = std::fs::read_to_string(filename).ok()?;
	source.lines().nth(index).map(str::to_string)
}

/// Logs an elaboration failure together with the offending source line
fn report(err: ElabError) -> ElabError {
	error!("{}", err);
	if let Some(location) = &err.location {
		if let Some(text) = source_line(&location.file, location.line) {
			error!("{}: {}", location, text.trim());
		}
	}
	err
}

/// Turns block functions into hardware statements
pub struct BlockElaborator {
	config: ElabConfig,
}

impl BlockElaborator {
	pub fn new(config: ElabConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &ElabConfig {
		&self.config
	}

	/// Elaborates a statement block of a generator.
	///
	/// The block may take a single argument which refers to the generator.
	/// All names visible to the block are taken from `env`.
	pub fn elaborate_block(
		&self,
		generator: &GeneratorHandle,
		tree: &SyntaxTree,
		function: NodeId,
		env: &Environment,
		block: &BlockContext,
	) -> Result<ElabResult, ElabError> {
		let definition = SourceRef::new(&block.filename, block.start_line);
		self.elaborate_block_impl(generator, tree, function, env, block)
			.map_err(|err| report(err.at(definition)))
	}

	fn elaborate_block_impl(
		&self,
		generator: &GeneratorHandle,
		tree: &SyntaxTree,
		function: NodeId,
		env: &Environment,
		block: &BlockContext,
	) -> Result<ElabResult, ElabError> {
		let def = function_def(tree, function)?;

		let mut env = env.clone();
		match def.params.as_slice() {
			[] => {},
			[owner] => env.bind(owner, generator_namespace(generator)),
			_ => return Err(SyntaxRestriction::InvalidBlockSignature(def.name).into()),
		}

		let mut ctx = BlockElabCtx::new(tree, env, &self.config, block, false);
		let (block_type, sensitivity) = ctx.classify(&def.name, &def.decorators, generator.design())?;
		info!(
			"Elaborating {} block '{}' ({}:{})",
			block_type, def.name, block.filename, block.start_line
		);

		let calls = ctx.rewrite(&def.body)?;

		let mut scope = Scope::new(generator.clone(), &block.filename).with_debug(self.config.debug);
		if let Some(locals) = &block.captured_locals {
			scope = scope.with_captured_locals(locals.clone());
		}
		ctx.execute(&mut scope, &calls)?;

		info!("Block '{}' produced {} statements", def.name, scope.statements().len());
		Ok(ElabResult {
			block_type,
			sensitivity,
			statements: scope.statements().to_vec(),
		})
	}

	/// Elaborates a function block into a generator function.
	///
	/// `arg_types` holds the (width, signed) pair of every argument except `self`.
	pub fn elaborate_function(
		&self,
		generator: &GeneratorHandle,
		tree: &SyntaxTree,
		function: NodeId,
		env: &Environment,
		block: &BlockContext,
		arg_types: &[(u32, bool)],
	) -> Result<FunctionResult, ElabError> {
		let definition = SourceRef::new(&block.filename, block.start_line);
		self.elaborate_function_impl(generator, tree, function, env, block, arg_types)
			.map_err(|err| report(err.at(definition)))
	}

	fn elaborate_function_impl(
		&self,
		generator: &GeneratorHandle,
		tree: &SyntaxTree,
		function: NodeId,
		env: &Environment,
		block: &BlockContext,
		arg_types: &[(u32, bool)],
	) -> Result<FunctionResult, ElabError> {
		let def = function_def(tree, function)?;
		let handle = generator.function(&def.name)?;
		info!(
			"Elaborating function '{}' ({}:{})",
			def.name, block.filename, block.start_line
		);

		let mut env = env.clone();
		let args = match def.params.split_first() {
			Some((owner, rest)) if owner == "self" => {
				env.bind(owner, generator_namespace(generator));
				rest
			},
			_ => def.params.as_slice(),
		};

		let scope = Scope::new(generator.clone(), &block.filename).with_debug(self.config.debug);
		let mut scope = FunctionScope::new(scope, handle.clone());
		let mut arg_order = BTreeMap::new();
		for (position, arg) in args.iter().enumerate() {
			let (width, signed) = arg_types
				.get(position)
				.copied()
				.ok_or_else(|| CompileTimeEvalError::MissingArgumentType(arg.clone()))?;
			let var = scope.input(arg, width, signed)?;
			env.bind(arg, Value::var(var));
			arg_order.insert(position, arg.clone());
		}

		let mut ctx = BlockElabCtx::new(tree, env, &self.config, block, true);
		let calls = ctx.rewrite(&def.body)?;
		ctx.execute(&mut scope, &calls)?;

		let statements = scope.into_scope().statements().to_vec();
		info!("Function '{}' produced {} statements", def.name, statements.len());
		Ok(FunctionResult {
			function: handle.id(),
			arg_order,
			statements,
		})
	}
}
