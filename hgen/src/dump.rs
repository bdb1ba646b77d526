use crate::design::{Design, Statement, StatementBlock, StatementKind, StmtId, VarId};
use std::fmt;
use thiserror::Error;

#[derive(Clone, Error, Debug)]
pub enum DumpError {
	#[error(transparent)]
	FormatError(#[from] fmt::Error),

	#[error("Invalid statement ID")]
	InvalidStatementId(StmtId),

	#[error("Invalid variable ID")]
	InvalidVariableId(VarId),
}

macro_rules! emitln {
	($self:ident, $($arg:tt)*) => {
		writeln!($self.output_stream, "{}{}", "\t".repeat($self.indent_level as usize), format!($($arg)*))
	}
}

/// Prints statements in a compact, human-readable form, one statement per line.
/// Conditional bodies are indented with tabs.
pub struct StatementPrinter<'a> {
	design: Design,
	indent_level: u32,
	show_metadata: bool,
	output_stream: &'a mut dyn fmt::Write,
}

impl<'a> StatementPrinter<'a> {
	pub fn new(design: Design, w: &'a mut dyn fmt::Write) -> Self {
		Self {
			design,
			indent_level: 0,
			show_metadata: false,
			output_stream: w,
		}
	}

	/// Appends source locations and debug values to printed statements
	pub fn with_metadata(mut self, show: bool) -> Self {
		self.show_metadata = show;
		self
	}

	fn begin_indent(&mut self) {
		self.indent_level += 1;
	}

	fn end_indent(&mut self) {
		assert!(self.indent_level > 0);
		self.indent_level -= 1;
	}

	fn var_str(&self, var: VarId) -> Result<String, DumpError> {
		self.design
			.get_variable(var)
			.map(|v| v.name)
			.ok_or(DumpError::InvalidVariableId(var))
	}

	fn metadata_str(&self, stmt: &Statement) -> String {
		if !self.show_metadata || (stmt.fn_ln.is_empty() && stmt.scope_vars.is_empty()) {
			return String::new();
		}

		let mut parts: Vec<String> = stmt.fn_ln.iter().map(|loc| loc.to_string()).collect();
		parts.extend(stmt.scope_vars.iter().map(|v| format!("{}={}", v.name, v.value)));
		format!(" // {}", parts.join(" "))
	}

	fn body_metadata_str(&self, body: &StatementBlock) -> String {
		if !self.show_metadata || body.fn_ln.is_empty() {
			return String::new();
		}

		let locs: Vec<String> = body.fn_ln.iter().map(|loc| loc.to_string()).collect();
		format!(" // {}", locs.join(" "))
	}

	fn print_statement(&mut self, id: StmtId) -> Result<(), DumpError> {
		let stmt = self.design.get_statement(id).ok_or(DumpError::InvalidStatementId(id))?;
		let meta = self.metadata_str(&stmt);

		use StatementKind::*;
		match &stmt.kind {
			Assign { lhs, rhs } => {
				let (lhs, rhs) = (self.var_str(*lhs)?, self.var_str(*rhs)?);
				emitln!(self, "{} = {}{}", lhs, rhs, meta)?;
			},
			Assert { value } => {
				let value = self.var_str(*value)?;
				emitln!(self, "assert {}{}", value, meta)?;
			},
			Return { value, .. } => {
				let value = self.var_str(*value)?;
				emitln!(self, "return {}{}", value, meta)?;
			},
			If {
				predicate,
				then_body,
				else_body,
			} => {
				// Binary expression names are already parenthesized
				let predicate = self.var_str(*predicate)?;
				if predicate.starts_with('(') {
					emitln!(self, "if {}{}", predicate, meta)?;
				}
				else {
					emitln!(self, "if ({}){}", predicate, meta)?;
				}
				self.print_body(then_body)?;

				if !else_body.stmts.is_empty() {
					let else_meta = self.body_metadata_str(else_body);
					emitln!(self, "else{}", else_meta)?;
					self.print_body(else_body)?;
				}
			},
		}
		Ok(())
	}

	fn print_body(&mut self, body: &StatementBlock) -> Result<(), DumpError> {
		self.begin_indent();
		for stmt in &body.stmts {
			self.print_statement(*stmt)?;
		}
		self.end_indent();
		Ok(())
	}

	/// Prints a list of top-level statements
	pub fn print_statements(&mut self, stmts: &[StmtId]) -> Result<(), DumpError> {
		for stmt in stmts {
			self.print_statement(*stmt)?;
		}
		Ok(())
	}
}

/// Convenience wrapper printing statements to a string
pub fn dump_statements(design: &Design, stmts: &[StmtId], show_metadata: bool) -> Result<String, DumpError> {
	let mut output = String::new();
	StatementPrinter::new(design.clone(), &mut output)
		.with_metadata(show_metadata)
		.print_statements(stmts)?;
	Ok(output)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::design::{Branch, DesignError, SourceRef};

	#[test]
	fn test_nested_dump() -> Result<(), DesignError> {
		let d = Design::new();
		let g = d.new_generator("top")?;
		let s = g.input("s", 2, false)?;
		let out = g.var("out", 1, false)?;

		let test = d.equals(s, 3.into())?;
		let cond = d.if_stmt(test);
		let then_stmt = d.assign(out, 1.into())?;
		let else_stmt = d.assign(out, 0.into())?;
		d.add_then_stmt(cond, then_stmt)?;
		d.add_else_stmt(cond, else_stmt)?;
		let check = d.assert_stmt(out);

		let text = dump_statements(&d, &[cond, check], false).unwrap();
		assert_eq!(text, "if (s == 3)\n\tout = 1\nelse\n\tout = 0\nassert out\n");
		Ok(())
	}

	#[test]
	fn test_metadata_dump() -> Result<(), DesignError> {
		let d = Design::new();
		let g = d.new_generator("top")?;
		let a = g.var("a", 1, false)?;
		let b = g.var("b", 1, false)?;

		let cond = d.if_stmt(b);
		let then_stmt = d.assign(a, 1.into())?;
		let else_stmt = d.assign(a, b.into())?;
		d.add_then_stmt(cond, then_stmt)?;
		d.add_else_stmt(cond, else_stmt)?;
		d.add_stmt_fn_ln(cond, SourceRef::new("top.py", 4));
		d.add_body_fn_ln(cond, Branch::Else, SourceRef::new("top.py", 7))?;
		d.add_stmt_fn_ln(then_stmt, SourceRef::new("top.py", 5));
		d.add_scope_variable(then_stmt, "i", "2", false);

		let text = dump_statements(&d, &[cond], true).unwrap();
		assert_eq!(
			text,
			"if (b) // top.py:4\n\ta = 1 // top.py:5 i=2\nelse // top.py:7\n\ta = b\n"
		);
		Ok(())
	}
}
