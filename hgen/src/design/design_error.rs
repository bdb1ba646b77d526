use thiserror::Error;

use super::{FunctionId, GeneratorId, StmtId};

#[derive(Clone, Debug)]
pub struct WidthMismatchError {
	pub target: String,
	pub target_width: u32,
	pub source: String,
	pub source_width: u32,
}

#[derive(Clone, Debug)]
pub struct VariableNameConflictError {
	pub generator: GeneratorId,
	pub function: Option<FunctionId>,
	pub name: String,
}

impl From<WidthMismatchError> for DesignError {
	fn from(err: WidthMismatchError) -> Self {
		Self::WidthMismatch(Box::new(err))
	}
}

impl From<VariableNameConflictError> for DesignError {
	fn from(err: VariableNameConflictError) -> Self {
		Self::VariableNameConflict(Box::new(err))
	}
}

/// Represents an error that can occur while constructing variables and statements.
/// Elaboration errors are not accounted for here.
#[derive(Clone, Debug, Error)]
pub enum DesignError {
	#[error("Invalid name '{0}'")]
	InvalidName(String),

	#[error("Generator name conflict: '{0}' already exists")]
	GeneratorNameConflict(String),

	#[error("Function name conflict: '{0}' already exists in this generator")]
	FunctionNameConflict(String),

	#[error("Variable name conflict in generator")]
	VariableNameConflict(Box<VariableNameConflictError>),

	#[error("Variable width must be positive")]
	InvalidWidth,

	#[error("Width mismatch: cannot use a {} bit value with a {} bit variable", .0.source_width, .0.target_width)]
	WidthMismatch(Box<WidthMismatchError>),

	#[error("Constant {value} cannot be represented with {width} bits")]
	ConstantOutOfRange { value: i64, width: u32 },

	#[error("Variable '{0}' cannot be assigned to")]
	NotAssignable(String),

	#[error("Bit index {index} is out of range for '{name}' ({width} bits wide)")]
	IndexOutOfRange { name: String, index: i64, width: u32 },

	#[error("Invalid bit slice [{hi}:{lo}] of '{name}'")]
	InvalidSlice { name: String, hi: i64, lo: i64 },

	#[error("At least one operand of a hardware expression must be a variable")]
	NoVariableOperand,

	#[error("Statement is already part of another statement body")]
	StatementAlreadyOwned(StmtId),

	#[error("Statement is not a conditional statement")]
	NotAConditional(StmtId),
}
