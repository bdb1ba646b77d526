use crate::core::{CompilerDiagnostic, CompilerDiagnosticBuilder, ProvidesCompilerDiagnostic};
use crate::eval::{CompileTimeEvalError, EvalError};
use crate::syntax::TreeError;
use hgen::{DesignError, SourceRef};
use std::fmt;
use thiserror::Error;

/// Constructs not allowed in statement blocks
#[derive(Clone, Debug, Error)]
pub enum SyntaxRestriction {
	#[error("Destructuring assignments are not supported")]
	DestructuringAssignment,

	#[error("Illegal syntax: {0}")]
	IllegalSyntax(String),

	#[error("Loop target must be a single name")]
	UnsupportedTarget,

	#[error("Unsupported raise statement '{0}'")]
	UnsupportedRaise(String),

	#[error("Statement blocks can have only one decoration")]
	MultipleDecorations,

	#[error("Unknown block decoration '{0}'")]
	UnknownDecoration(String),

	#[error("Malformed sensitivity entry '{0}'")]
	MalformedSensitivity(String),

	#[error("Statement block '{0}' is not decorated")]
	UndecoratedBlock(String),

	#[error("Return statements are only allowed in functions")]
	ReturnOutsideFunction,

	#[error("Invalid signature of statement block '{0}'")]
	InvalidBlockSignature(String),

	#[error("Unsupported statement '{0}'")]
	UnsupportedSyntax(String),

	#[error("Expected a function definition")]
	NotAFunction,

	#[error(transparent)]
	MalformedTree(#[from] TreeError),
}

impl ProvidesCompilerDiagnostic for SyntaxRestriction {
	fn to_diagnostic(&self) -> CompilerDiagnostic {
		use SyntaxRestriction::*;
		let help = match self {
			DestructuringAssignment => "Assign each variable in a separate statement.",
			IllegalSyntax(_) => "Remove the else clause of the loop.",
			UnsupportedTarget => "Use a single loop variable, e.g. `for i in range(4)`.",
			UnsupportedRaise(_) => "Only `raise Exception(...)` is supported - it acts as an always failing assertion.",
			MultipleDecorations => "Use exactly one of `always_comb`, `always_ff(...)` or `initial`.",
			UnknownDecoration(_) => "Use one of `always_comb`, `always_ff(...)` or `initial`.",
			MalformedSensitivity(_) => "Sensitivity entries must be (posedge, signal) or (negedge, signal) pairs.",
			UndecoratedBlock(_) => "Decorate the block with `always_comb`, `always_ff(...)` or `initial`.",
			ReturnOutsideFunction => "Only function blocks can return values.",
			InvalidBlockSignature(_) => "Statement blocks take no arguments except for `self`.",
			UnsupportedSyntax(_) => "Statement blocks may only contain assignments, conditionals, loops and assertions.",
			NotAFunction => "Pass the node of a function definition.",
			MalformedTree(_) => "The syntax tree is corrupted.",
		};

		CompilerDiagnosticBuilder::from_error(self)
			.error_code("blocklang::syntax")
			.help(help)
			.build()
	}
}

/// Kinds of errors which abort elaboration
#[derive(Clone, Debug, Error)]
pub enum ElabErrorKind {
	#[error(transparent)]
	SyntaxRestriction(#[from] SyntaxRestriction),

	#[error(transparent)]
	CompileTimeEval(#[from] CompileTimeEvalError),

	#[error("Expression '{expression}' mixes signals and compile-time values")]
	MixedOperand { expression: String },

	#[error(transparent)]
	Semantic(#[from] DesignError),
}

impl From<EvalError> for ElabErrorKind {
	fn from(err: EvalError) -> Self {
		match err {
			EvalError::CompileTime(err) => err.into(),
			EvalError::Design(err) => err.into(),
		}
	}
}

impl ProvidesCompilerDiagnostic for ElabErrorKind {
	fn to_diagnostic(&self) -> CompilerDiagnostic {
		use ElabErrorKind::*;
		match self {
			SyntaxRestriction(err) => err.to_diagnostic(),
			CompileTimeEval(err) => err.to_diagnostic(),
			MixedOperand { .. } => CompilerDiagnosticBuilder::from_error(self)
				.error_code("blocklang::mixed_operand")
				.help("All operands of a boolean expression involving signals must be signals.")
				.build(),
			Semantic(err) => CompilerDiagnosticBuilder::from_error(err)
				.error_code("hgen::design")
				.help("The design rejected the statement.")
				.build(),
		}
	}
}

/// Elaboration error with the source location it originates from
#[derive(Clone, Debug)]
pub struct ElabError {
	pub kind: ElabErrorKind,
	pub location: Option<SourceRef>,
}

impl ElabError {
	pub fn new(kind: ElabErrorKind) -> Self {
		Self { kind, location: None }
	}

	/// Attaches a location unless one is already known
	pub fn at(mut self, location: SourceRef) -> Self {
		if self.location.is_none() {
			self.location = Some(location);
		}
		self
	}
}

impl fmt::Display for ElabError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.location {
			Some(location) => write!(f, "{}: {}", location, self.kind),
			None => write!(f, "{}", self.kind),
		}
	}
}

impl std::error::Error for ElabError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		Some(&self.kind)
	}
}

impl From<ElabErrorKind> for ElabError {
	fn from(kind: ElabErrorKind) -> Self {
		Self::new(kind)
	}
}

impl From<SyntaxRestriction> for ElabError {
	fn from(err: SyntaxRestriction) -> Self {
		Self::new(err.into())
	}
}

impl From<CompileTimeEvalError> for ElabError {
	fn from(err: CompileTimeEvalError) -> Self {
		Self::new(err.into())
	}
}

impl From<EvalError> for ElabError {
	fn from(err: EvalError) -> Self {
		Self::new(err.into())
	}
}

impl From<DesignError> for ElabError {
	fn from(err: DesignError) -> Self {
		Self::new(err.into())
	}
}

impl From<TreeError> for ElabError {
	fn from(err: TreeError) -> Self {
		Self::new(SyntaxRestriction::from(err).into())
	}
}

impl ProvidesCompilerDiagnostic for ElabError {
	fn to_diagnostic(&self) -> CompilerDiagnostic {
		let mut builder = self.kind.to_diagnostic_builder();
		if let Some(location) = &self.location {
			builder = builder.location(&location.to_string());
		}
		builder.build()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_error_display() {
		let err = ElabError::from(SyntaxRestriction::ReturnOutsideFunction).at(SourceRef::new("top.py", 14));
		assert_eq!(
			err.to_string(),
			"top.py:14: Return statements are only allowed in functions"
		);

		// The first location sticks
		let err = err.at(SourceRef::new("top.py", 20));
		assert_eq!(err.location, Some(SourceRef::new("top.py", 14)));

		let diag = err.to_diagnostic();
		assert_eq!(diag.to_string(), "top.py:14: Return statements are only allowed in functions");
		assert_eq!(diag.help_text(), Some("Only function blocks can return values."));
	}
}
