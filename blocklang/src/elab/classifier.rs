use super::{BlockElabCtx, ElabError, SyntaxRestriction};
use crate::eval::{CompileTimeEvalError, Interpreter, Value};
use crate::syntax::{NodeId, NodeKind};
use hgen::Design;
use log::{debug, warn};
use std::fmt;

/// Kind of a statement block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockType {
	Combinational,
	Sequential,
	Initial,
}

impl fmt::Display for BlockType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			BlockType::Combinational => "Combinational",
			BlockType::Sequential => "Sequential",
			BlockType::Initial => "Initial",
		};
		write!(f, "{}", name)
	}
}

/// Signal edge triggering a sequential block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
	Posedge,
	Negedge,
}

impl EdgeKind {
	/// Parses an edge token such as `posedge` or `BlockEdgeType.negedge`
	fn from_token(token: &str) -> Option<Self> {
		match token.to_ascii_lowercase().as_str() {
			"posedge" => Some(EdgeKind::Posedge),
			"negedge" => Some(EdgeKind::Negedge),
			_ => None,
		}
	}
}

impl fmt::Display for EdgeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EdgeKind::Posedge => write!(f, "Posedge"),
			EdgeKind::Negedge => write!(f, "Negedge"),
		}
	}
}

/// Entry of a sequential block sensitivity list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SensitivityEntry {
	pub edge: EdgeKind,
	pub signal: String,
}

impl SensitivityEntry {
	pub fn new(edge: EdgeKind, signal: &str) -> Self {
		Self {
			edge,
			signal: signal.into(),
		}
	}
}

/// Decoration attached to a block function
#[derive(Clone, Debug, PartialEq)]
pub(super) enum Decoration {
	Undecorated,
	Combinational,
	Initial,
	Sequential(Vec<NodeId>),
}

impl BlockElabCtx<'_> {
	/// Last segment of a (possibly dotted) name
	fn trailing_name(&self, node: NodeId) -> Option<&str> {
		match self.tree.kind(node) {
			NodeKind::Name { id } => Some(id),
			NodeKind::Attribute { attr, .. } => Some(attr),
			_ => None,
		}
	}

	/// Determines which decoration the function carries
	pub(super) fn decoration(&self, decorators: &[NodeId]) -> Result<Decoration, ElabError> {
		let decorator = match decorators {
			[] => return Ok(Decoration::Undecorated),
			[decorator] => *decorator,
			[_, second, ..] => return Err(self.error_at(*second, SyntaxRestriction::MultipleDecorations)),
		};

		let (name_node, args) = match self.tree.kind(decorator) {
			NodeKind::Call { func, args } => (*func, Some(args.clone())),
			_ => (decorator, None),
		};

		let unknown = || self.error_at(decorator, SyntaxRestriction::UnknownDecoration(self.tree.render(decorator)));
		let name = self.trailing_name(name_node).ok_or_else(unknown)?;

		match (name, args) {
			("always_comb", None) => Ok(Decoration::Combinational),
			("initial", None) => Ok(Decoration::Initial),
			("always_comb", Some(args)) if args.is_empty() => Ok(Decoration::Combinational),
			("initial", Some(args)) if args.is_empty() => Ok(Decoration::Initial),
			("always_ff", Some(args)) => Ok(Decoration::Sequential(args)),
			("always_comb" | "initial" | "always_ff", _) => Err(self.error_at(
				decorator,
				SyntaxRestriction::MalformedSensitivity(self.tree.render(decorator)),
			)),
			_ => Err(unknown()),
		}
	}

	/// Determines block type and sensitivity list
	pub(super) fn classify(
		&self,
		block_name: &str,
		decorators: &[NodeId],
		design: &Design,
	) -> Result<(BlockType, Vec<SensitivityEntry>), ElabError> {
		let (block_type, sensitivity) = match self.decoration(decorators)? {
			Decoration::Undecorated if self.config.require_decoration => {
				return Err(SyntaxRestriction::UndecoratedBlock(block_name.into()).into());
			},
			Decoration::Undecorated => {
				warn!(
					"Statement block '{}' is not decorated, treating it as combinational. Undecorated blocks are deprecated.",
					block_name
				);
				(BlockType::Combinational, vec![])
			},
			Decoration::Combinational => (BlockType::Combinational, vec![]),
			Decoration::Initial => (BlockType::Initial, vec![]),
			Decoration::Sequential(entries) => {
				let sensitivity = entries
					.iter()
					.map(|entry| self.sensitivity_entry(*entry, design))
					.collect::<Result<Vec<_>, _>>()?;
				(BlockType::Sequential, sensitivity)
			},
		};

		debug!("Block '{}' classified as {} ({:?})", block_name, block_type, sensitivity);
		Ok((block_type, sensitivity))
	}

	fn sensitivity_entry(&self, entry: NodeId, design: &Design) -> Result<SensitivityEntry, ElabError> {
		let malformed = || self.error_at(entry, SyntaxRestriction::MalformedSensitivity(self.tree.render(entry)));

		let (edge, signal) = match self.tree.kind(entry) {
			NodeKind::Tuple { elts } if elts.len() == 2 => (elts[0], elts[1]),
			_ => return Err(malformed()),
		};

		let edge = self
			.trailing_name(edge)
			.and_then(EdgeKind::from_token)
			.ok_or_else(malformed)?;

		if let NodeKind::Str { value } = self.tree.kind(signal) {
			return Ok(SensitivityEntry::new(edge, value));
		}

		let undefined = || self.error_at(signal, CompileTimeEvalError::UndefinedSignal(self.tree.render(signal)));
		let value = Interpreter::build(&self.tree, &self.env, design)
			.eval(signal)
			.map_err(|_| undefined())?;

		match value {
			Value::Signal(_) => {
				let var = value.as_var().ok_or_else(undefined)?;
				Ok(SensitivityEntry::new(edge, &design.var_name(var)))
			},
			_ => Err(undefined()),
		}
	}
}
