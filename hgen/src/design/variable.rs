use std::fmt;

use super::{FunctionId, GeneratorId, SourceRef, VarId};

/// Specifies direction of a variable exposed by a generator or function
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortDirection {
	/// Driven from outside, cannot be assigned
	Input,

	/// Driven from inside
	Output,

	/// Internal variable, not exposed
	Internal,
}

/// Binary operators available on variables
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
	Add,
	Subtract,
	Multiply,
	Divide,
	Modulo,
	ShiftLeft,
	ShiftRight,
	BitwiseAnd,
	BitwiseOr,
	BitwiseXor,
	Equal,
	NotEqual,
	Less,
	LessEqual,
	Greater,
	GreaterEqual,
	LogicalAnd,
	LogicalOr,
}

impl BinaryOp {
	/// Comparisons and logical operators always produce a single bit
	pub fn is_boolean(&self) -> bool {
		use BinaryOp::*;
		matches!(
			self,
			Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual | LogicalAnd | LogicalOr
		)
	}

	/// Operators which require both operands to have the same width
	pub fn requires_matching_widths(&self) -> bool {
		use BinaryOp::*;
		!matches!(self, ShiftLeft | ShiftRight | LogicalAnd | LogicalOr)
	}

	pub fn symbol(&self) -> &'static str {
		use BinaryOp::*;
		match self {
			Add => "+",
			Subtract => "-",
			Multiply => "*",
			Divide => "/",
			Modulo => "%",
			ShiftLeft => "<<",
			ShiftRight => ">>",
			BitwiseAnd => "&",
			BitwiseOr => "|",
			BitwiseXor => "^",
			Equal => "==",
			NotEqual => "!=",
			Less => "<",
			LessEqual => "<=",
			Greater => ">",
			GreaterEqual => ">=",
			LogicalAnd => "&&",
			LogicalOr => "||",
		}
	}
}

/// Unary operators available on variables
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
	Negate,
	LogicalNot,
	BitwiseNot,
}

impl UnaryOp {
	pub fn symbol(&self) -> &'static str {
		use UnaryOp::*;
		match self {
			Negate => "-",
			LogicalNot => "!",
			BitwiseNot => "~",
		}
	}
}

/// Operand of a variable operation - either a variable or a plain integer
/// which gets converted into a constant of matching width
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
	Var(VarId),
	Int(i64),
}

impl From<VarId> for Operand {
	fn from(var: VarId) -> Self {
		Self::Var(var)
	}
}

impl From<i64> for Operand {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

/// Determines what a variable represents
#[derive(Clone, Debug)]
pub enum VarKind {
	/// Named variable declared in a generator or function
	Base { direction: PortDirection },

	/// Constant value
	Constant { value: i64 },

	/// Bit range of another variable (both ends inclusive)
	Slice { parent: VarId, hi: u32, lo: u32 },

	/// Result of a binary operation
	Binary { op: BinaryOp, lhs: VarId, rhs: VarId },

	/// Result of a unary operation
	Unary { op: UnaryOp, operand: VarId },
}

/// Hardware variable representation
#[derive(Clone, Debug)]
pub struct Variable {
	/// Self-reference
	pub(super) id: VarId,

	/// Owning generator (constants have none)
	pub generator: Option<GeneratorId>,

	/// Owning function (function arguments only)
	pub function: Option<FunctionId>,

	/// Name of the variable. Derived variables carry their rendered expression.
	pub name: String,

	/// Bit width
	pub width: u32,

	/// Signedness
	pub signed: bool,

	/// What the variable represents
	pub kind: VarKind,

	/// Source locations where the variable was used
	pub fn_ln: Vec<SourceRef>,
}

impl Variable {
	pub fn id(&self) -> VarId {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Checks whether the variable can appear on the left-hand side of an assignment
	pub fn is_base(&self) -> bool {
		matches!(self.kind, VarKind::Base { .. })
	}

	pub fn is_constant(&self) -> bool {
		matches!(self.kind, VarKind::Constant { .. })
	}
}

impl fmt::Display for Variable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.name)
	}
}
