use crate::core::{CompilerDiagnostic, CompilerDiagnosticBuilder, ProvidesCompilerDiagnostic};
use thiserror::Error;

/// Errors of compile-time evaluation and of compile-time control flow resolution
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CompileTimeEvalError {
	#[error("Name '{0}' is not defined")]
	UndefinedName(String),

	#[error("Name '{0}' has no compile-time value")]
	UnresolvedName(String),

	#[error("Unsupported expression '{0}'")]
	UnsupportedExpression(String),

	#[error("Invalid operands in '{expression}': {reason}")]
	InvalidOperands { expression: String, reason: String },

	#[error("Division by zero in '{0}'")]
	DivisionByZero(String),

	#[error("Index {index} is out of range for a sequence of length {len}")]
	IndexOutOfRange { index: i64, len: usize },

	#[error("'{expression}' has no attribute '{attr}'")]
	NoSuchAttribute { expression: String, attr: String },

	#[error("Signal-valued expression '{0}' used where a compile-time value is required")]
	SignalInHostContext(String),

	#[error("Loop value {0} is not an integer, string or boolean literal")]
	NonLiteralLoopValue(String),

	#[error("Cannot resolve loop iterable '{expression}': {reason}")]
	UnresolvableIterable { expression: String, reason: String },

	#[error("Condition '{expression}' evaluates to a {type_name}, expected a boolean or a signal")]
	NonBooleanPredicate { expression: String, type_name: String },

	#[error("Sensitivity signal '{0}' does not refer to a variable")]
	UndefinedSignal(String),

	#[error("Sequence exceeds the limit of {limit} loop iterations")]
	TooManyIterations { limit: usize },

	#[error("Cannot assign to '{0}'")]
	InvalidAssignTarget(String),

	#[error("Cannot assign '{0}' to a variable")]
	InvalidAssignValue(String),

	#[error("Assertion value '{0}' must be a variable or 0")]
	InvalidAssertValue(String),

	#[error("Cannot return '{0}' from a function")]
	InvalidReturnValue(String),

	#[error("No argument type provided for '{0}'")]
	MissingArgumentType(String),
}

impl ProvidesCompilerDiagnostic for CompileTimeEvalError {
	fn to_diagnostic(&self) -> CompilerDiagnostic {
		use CompileTimeEvalError::*;
		let help = match self {
			UndefinedName(_) => "Make sure the name is defined in the enclosing environment.",
			UnresolvedName(_) => "The name exists but its value is not known at elaboration time.",
			UnsupportedExpression(_) => "Only a restricted subset of expressions can be evaluated during elaboration.",
			InvalidOperands { .. } => "Check the types of the operands.",
			DivisionByZero(_) => "The divisor evaluates to zero.",
			IndexOutOfRange { .. } => "Index must be smaller than the sequence length.",
			NoSuchAttribute { .. } => "Check the attribute name.",
			SignalInHostContext(_) => "Signals cannot be used where the value has to be known during elaboration.",
			NonLiteralLoopValue(_) => "Loops can only iterate over integers, strings and booleans.",
			UnresolvableIterable { .. } => "Loop iterables must be known during elaboration, e.g. range(4) or a list literal.",
			NonBooleanPredicate { .. } => "Use a comparison to obtain a boolean value.",
			UndefinedSignal(_) => "Sensitivity entries must name a variable of the generator.",
			TooManyIterations { .. } => "Reduce the number of loop iterations or raise the iteration limit.",
			InvalidAssignTarget(_) => "Only variables and their bit ranges can be assigned to.",
			InvalidAssignValue(_) => "Assigned values must be variables or integers.",
			InvalidAssertValue(_) => "Pass a variable, or use `raise Exception()` for an always failing assertion.",
			InvalidReturnValue(_) => "Returned values must be variables or integers.",
			MissingArgumentType(_) => "Provide a (width, signed) pair for every function argument.",
		};

		CompilerDiagnosticBuilder::from_error(self)
			.error_code("blocklang::eval")
			.help(help)
			.build()
	}
}

/// Failure of an evaluation - either a compile-time error or an error
/// reported by the design while constructing signal expressions
#[derive(Clone, Debug, Error)]
pub enum EvalError {
	#[error(transparent)]
	CompileTime(#[from] CompileTimeEvalError),

	#[error(transparent)]
	Design(#[from] hgen::DesignError),
}
