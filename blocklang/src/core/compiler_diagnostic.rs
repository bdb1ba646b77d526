use miette::{Diagnostic, Severity};
use std::error::Error;
use std::fmt;
use std::fmt::Debug;
use std::fmt::Display;

/// A generic elaboration diagnostic message
#[derive(Clone, Debug)]
pub struct CompilerDiagnostic {
	severity: Severity,
	error_text: String,
	help_text: Option<String>,
	error_code: Option<String>,
	location: Option<String>,
}

/// Used to conveniently craft diagnostic messages
pub struct CompilerDiagnosticBuilder {
	diag: CompilerDiagnostic,
}

impl From<CompilerDiagnostic> for CompilerDiagnosticBuilder {
	fn from(diag: CompilerDiagnostic) -> Self {
		Self { diag }
	}
}

impl CompilerDiagnosticBuilder {
	/// Creates an error diagnostic from an error type
	pub fn from_error<ErrorType>(err: &ErrorType) -> Self
	where
		ErrorType: Error,
	{
		Self::new_error(&err.to_string())
	}

	/// Creates a new error message
	pub fn new_error(msg: &str) -> Self {
		CompilerDiagnostic::new_error(msg).into()
	}

	/// Creates a new warning message
	pub fn new_warning(msg: &str) -> Self {
		CompilerDiagnostic::new_warning(msg).into()
	}

	/// Creates a new info message
	pub fn new_info(msg: &str) -> Self {
		CompilerDiagnostic::new_info(msg).into()
	}

	/// Attaches an error code
	pub fn error_code(mut self, code: &str) -> Self {
		self.diag.set_error_code(code);
		self
	}

	/// Attaches a help message
	pub fn help(mut self, help: &str) -> Self {
		self.diag.set_help(help);
		self
	}

	/// Attaches the source location (file:line) the message refers to
	pub fn location(mut self, location: &str) -> Self {
		self.diag.set_location(location);
		self
	}

	/// Returns the new diagnostic
	pub fn build(self) -> CompilerDiagnostic {
		self.diag
	}
}

impl Display for CompilerDiagnostic {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match &self.location {
			Some(location) => write!(f, "{}: {}", location, self.error_text),
			None => write!(f, "{}", self.error_text),
		}
	}
}

impl Error for CompilerDiagnostic {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		None
	}
}

impl Diagnostic for CompilerDiagnostic {
	fn code<'a>(&'a self) -> Option<Box<(dyn std::fmt::Display + 'a)>> {
		self.error_code
			.as_ref()
			.map(|msg| Box::new(msg.clone()) as Box<dyn Display + 'a>)
	}

	fn severity(&self) -> Option<miette::Severity> {
		Some(self.severity)
	}

	fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
		self.help_text
			.as_ref()
			.map(|msg| Box::new(msg.clone()) as Box<dyn Display + 'a>)
	}
}

impl CompilerDiagnostic {
	/// Creates a new diagnostic message
	fn new(severity: miette::Severity, msg: &str) -> Self {
		Self {
			severity,
			help_text: None,
			error_text: msg.into(),
			error_code: None,
			location: None,
		}
	}

	/// Creates a new error diagnostic
	pub fn new_error(msg: &str) -> Self {
		Self::new(miette::Severity::Error, msg)
	}

	/// Creates a new warning diagnostic
	pub fn new_warning(msg: &str) -> Self {
		Self::new(miette::Severity::Warning, msg)
	}

	/// Creates a new info diagnostic
	pub fn new_info(msg: &str) -> Self {
		Self::new(miette::Severity::Advice, msg)
	}

	/// Sets the help message
	pub fn set_help(&mut self, help: &str) {
		self.help_text = Some(help.into());
	}

	/// Set the error code
	pub fn set_error_code(&mut self, code: &str) {
		self.error_code = Some(code.into());
	}

	pub fn set_location(&mut self, location: &str) {
		self.location = Some(location.into());
	}

	pub fn help_text(&self) -> Option<&str> {
		self.help_text.as_deref()
	}
}

/// Indicates that type can provide a CompilerDiagnostic message.
/// All elaboration error types must implement this trait.
pub trait ProvidesCompilerDiagnostic {
	/// Must be implemented by the error type
	fn to_diagnostic(&self) -> CompilerDiagnostic;

	/// Returns a diagnostic message builder - useful when you want to modify the message
	fn to_diagnostic_builder(&self) -> CompilerDiagnosticBuilder {
		self.to_diagnostic().into()
	}

	/// Returns a Miette report
	fn to_miette_report(&self) -> miette::Report {
		miette::Report::new(self.to_diagnostic())
	}
}

/// Implements ProvidesCompilerDiagnostic for reference types
/// for convenience
impl<T> ProvidesCompilerDiagnostic for &T
where
	T: ProvidesCompilerDiagnostic,
{
	fn to_diagnostic(&self) -> CompilerDiagnostic {
		(*self).to_diagnostic()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_builder() {
		let diag = CompilerDiagnosticBuilder::new_error("Something went wrong")
			.help("Try again")
			.error_code("blocklang::test")
			.location("top.py:12")
			.build();

		assert_eq!(diag.to_string(), "top.py:12: Something went wrong");
		assert_eq!(diag.help_text(), Some("Try again"));
		assert_eq!(diag.severity(), Some(Severity::Error));
		assert_eq!(diag.code().map(|c| c.to_string()), Some("blocklang::test".to_string()));
	}
}
