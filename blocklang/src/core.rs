pub mod compiler_diagnostic;

pub use compiler_diagnostic::CompilerDiagnostic;
pub use compiler_diagnostic::CompilerDiagnosticBuilder;
pub use compiler_diagnostic::ProvidesCompilerDiagnostic;
