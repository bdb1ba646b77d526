use super::{source_line, ElabError, SyntaxRestriction};
use crate::eval::{CompileTimeEvalError, Signal, Value};
use hgen::{Branch, Design, DesignError, FunctionHandle, GeneratorHandle, Operand, SourceRef, StmtId, VarId};
use log::error;

/// Collects statements generated for a block and attaches debug metadata to them
pub struct Scope {
	generator: GeneratorHandle,
	stmts: Vec<StmtId>,
	filename: String,

	/// Attach source lines to statements and variables
	debug: bool,

	/// Host-language locals attached to every assignment
	captured_locals: Option<Vec<(String, Value)>>,
}

impl Scope {
	pub fn new(generator: GeneratorHandle, filename: &str) -> Self {
		Self {
			generator,
			stmts: vec![],
			filename: filename.into(),
			debug: false,
			captured_locals: None,
		}
	}

	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	pub fn with_captured_locals(mut self, locals: Vec<(String, Value)>) -> Self {
		self.captured_locals = Some(locals);
		self
	}

	pub fn design(&self) -> &Design {
		self.generator.design()
	}

	/// Top-level statements in the order they were added
	pub fn statements(&self) -> &[StmtId] {
		&self.stmts
	}

	fn location(&self, line: u32) -> SourceRef {
		SourceRef::new(&self.filename, line)
	}

	/// Location recorded as metadata (only in debug mode)
	fn metadata_location(&self, line: Option<u32>) -> Option<SourceRef> {
		line.filter(|_| self.debug).map(|line| self.location(line))
	}

	fn attach_values(&self, stmt: StmtId, values: &[(String, Value)]) {
		let design = self.design();
		for (name, value) in values {
			design.add_scope_variable(stmt, name, &value.describe(design), value.is_signal());
		}
	}

	/// Attaches captured host locals. Only scalars and named signals are recorded.
	fn attach_locals(&self, stmt: StmtId) {
		let Some(locals) = &self.captured_locals
		else {
			return;
		};

		let design = self.design();
		for (name, value) in locals {
			match value {
				Value::Int(_) | Value::Str(_) | Value::Bool(_) | Value::Signal(Signal::Var(_)) => {
					design.add_scope_variable(stmt, name, &value.describe(design), value.is_signal())
				},
				_ => {},
			}
		}
	}

	/// Logs the source line a design operation failed on
	fn semantic_failure(&self, line: Option<u32>, err: DesignError) -> ElabError {
		let err = ElabError::from(err);
		let Some(line) = line
		else {
			return err;
		};

		let location = self.location(line);
		error!("{}: {}", location, err.kind);
		if let Some(text) = source_line(&self.filename, line) {
			error!("{}", text.trim());
		}
		err.at(location)
	}

	/// Builds a conditional statement with the given then-branch
	pub fn if_<S: Into<StmtId>>(
		&mut self,
		test: &Value,
		then_stmts: impl IntoIterator<Item = S>,
		line: Option<u32>,
		loop_vars: &[(String, Value)],
	) -> Result<IfHandle, ElabError> {
		let predicate = test.as_var().ok_or_else(|| {
			ElabError::from(CompileTimeEvalError::NonBooleanPredicate {
				expression: test.to_string(),
				type_name: test.type_name().into(),
			})
		})?;

		let design = self.design().clone();
		let stmt = design.if_stmt(predicate);
		for then_stmt in then_stmts {
			design
				.add_then_stmt(stmt, then_stmt.into())
				.map_err(|err| self.semantic_failure(line, err))?;
		}

		if let Some(location) = self.metadata_location(line) {
			design.add_var_fn_ln(predicate, location.clone());
			design.add_stmt_fn_ln(stmt, location.clone());
			design
				.add_body_fn_ln(stmt, Branch::Then, location)
				.map_err(|err| self.semantic_failure(line, err))?;
		}
		self.attach_values(stmt, loop_vars);

		Ok(IfHandle {
			design,
			stmt,
			filename: self.filename.clone(),
			debug: self.debug,
		})
	}

	/// Builds an assignment statement
	pub fn assign(
		&mut self,
		target: &Value,
		value: &Value,
		line: Option<u32>,
		loop_vars: &[(String, Value)],
	) -> Result<StmtId, ElabError> {
		let target = target
			.as_var()
			.ok_or_else(|| ElabError::from(CompileTimeEvalError::InvalidAssignTarget(target.to_string())))?;

		let value = match value {
			Value::Signal(_) => value.as_var().map(Operand::from),
			Value::Int(v) => Some(Operand::Int(*v)),
			Value::Bool(v) => Some(Operand::Int(*v as i64)),
			_ => None,
		}
		.ok_or_else(|| ElabError::from(CompileTimeEvalError::InvalidAssignValue(value.to_string())))?;

		let design = self.design().clone();
		let stmt = design
			.assign(target, value)
			.map_err(|err| self.semantic_failure(line, err))?;

		if let Some(location) = self.metadata_location(line) {
			design.add_stmt_fn_ln(stmt, location);
		}
		self.attach_locals(stmt);
		self.attach_values(stmt, loop_vars);
		Ok(stmt)
	}

	/// Builds an assertion. Integer zero asserts the false constant.
	pub fn assert_(&mut self, value: &Value, line: Option<u32>, loop_vars: &[(String, Value)]) -> Result<StmtId, ElabError> {
		let design = self.design().clone();
		let var = match value {
			Value::Int(0) => design.false_constant(),
			_ => value
				.as_var()
				.ok_or_else(|| ElabError::from(CompileTimeEvalError::InvalidAssertValue(value.to_string())))?,
		};

		let stmt = design.assert_stmt(var);
		if let Some(location) = self.metadata_location(line) {
			design.add_stmt_fn_ln(stmt, location);
		}
		self.attach_locals(stmt);
		self.attach_values(stmt, loop_vars);
		Ok(stmt)
	}

	/// Appends a top-level statement
	pub fn add_stmt(&mut self, stmt: impl Into<StmtId>) {
		self.stmts.push(stmt.into());
	}
}

/// Conditional statement under construction
pub struct IfHandle {
	design: Design,
	stmt: StmtId,
	filename: String,
	debug: bool,
}

impl IfHandle {
	/// Fills in the else branch
	pub fn else_<S: Into<StmtId>>(
		self,
		stmts: impl IntoIterator<Item = S>,
		line: Option<u32>,
	) -> Result<Self, ElabError> {
		for stmt in stmts {
			self.design.add_else_stmt(self.stmt, stmt.into()).map_err(|err| {
				let err = ElabError::from(err);
				match line {
					Some(line) => err.at(SourceRef::new(&self.filename, line)),
					None => err,
				}
			})?;
		}

		if let Some(line) = line.filter(|_| self.debug) {
			self.design
				.add_body_fn_ln(self.stmt, Branch::Else, SourceRef::new(&self.filename, line))?;
		}
		Ok(self)
	}
}

impl From<IfHandle> for StmtId {
	fn from(handle: IfHandle) -> Self {
		handle.stmt
	}
}

/// Scope which statements can be generated in
pub trait StatementScope {
	fn scope(&mut self) -> &mut Scope;

	/// Builds a return statement
	fn return_(&mut self, value: &Value, line: Option<u32>) -> Result<StmtId, ElabError>;
}

impl StatementScope for Scope {
	fn scope(&mut self) -> &mut Scope {
		self
	}

	fn return_(&mut self, _value: &Value, _line: Option<u32>) -> Result<StmtId, ElabError> {
		Err(SyntaxRestriction::ReturnOutsideFunction.into())
	}
}

/// Scope of a function block. Return statements are allowed here.
pub struct FunctionScope {
	scope: Scope,
	function: FunctionHandle,
}

impl FunctionScope {
	pub fn new(scope: Scope, function: FunctionHandle) -> Self {
		Self { scope, function }
	}

	/// Declares a function argument
	pub fn input(&mut self, name: &str, width: u32, signed: bool) -> Result<VarId, ElabError> {
		Ok(self.function.input(name, width, signed)?)
	}

	pub fn into_scope(self) -> Scope {
		self.scope
	}
}

impl StatementScope for FunctionScope {
	fn scope(&mut self) -> &mut Scope {
		&mut self.scope
	}

	fn return_(&mut self, value: &Value, line: Option<u32>) -> Result<StmtId, ElabError> {
		let operand = match value {
			Value::Signal(_) => value.as_var().map(Operand::from),
			Value::Int(v) => Some(Operand::Int(*v)),
			_ => None,
		}
		.ok_or_else(|| ElabError::from(CompileTimeEvalError::InvalidReturnValue(value.to_string())))?;

		let stmt = self
			.function
			.return_stmt(operand)
			.map_err(|err| self.scope.semantic_failure(line, err))?;

		if let Some(location) = self.scope.metadata_location(line) {
			self.scope.design().add_stmt_fn_ln(stmt, location);
		}
		Ok(stmt)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::elab::test::{block_env, dump};

	#[test]
	fn test_scope_statements() {
		let (design, generator, _env) = block_env();
		let mut scope = Scope::new(generator.clone(), "top.py").with_debug(true);

		let s = Value::var(generator.get_var("s").unwrap());
		let out = Value::var(generator.get_var("out").unwrap());
		let test = Value::var(design.equals(s.as_var().unwrap(), Operand::Int(3)).unwrap());

		let then_stmt = scope.assign(&out, &Value::Int(1), Some(12), &[]).unwrap();
		let else_stmt = scope.assign(&out, &Value::Bool(false), Some(14), &[]).unwrap();
		let handle = scope
			.if_(&test, [then_stmt], Some(11), &[("i".into(), Value::Int(2))])
			.unwrap();
		let handle = handle.else_([else_stmt], Some(14)).unwrap();
		scope.add_stmt(handle);

		let check = scope.assert_(&Value::Int(0), Some(15), &[]).unwrap();
		scope.add_stmt(check);

		assert_eq!(
			dump(&design, scope.statements()),
			"if (s == 3)\n\tout = 1\nelse\n\tout = 0\nassert 0\n"
		);

		let stmt = design.get_statement(scope.statements()[0]).unwrap();
		assert_eq!(stmt.fn_ln, vec![SourceRef::new("top.py", 11)]);
		assert_eq!(stmt.scope_variable("i").unwrap().value, "2");
		assert_eq!(
			stmt.body(Branch::Else).unwrap().fn_ln,
			vec![SourceRef::new("top.py", 14)]
		);

		let predicate = design.get_variable(test.as_var().unwrap()).unwrap();
		assert_eq!(predicate.fn_ln, vec![SourceRef::new("top.py", 11)]);
	}

	#[test]
	fn test_invalid_values() {
		let (_design, generator, _env) = block_env();
		let mut scope = Scope::new(generator.clone(), "top.py");
		let out = Value::var(generator.get_var("out").unwrap());

		let err = scope.assign(&Value::Int(1), &out, None, &[]).unwrap_err();
		assert!(matches!(
			err.kind,
			crate::elab::ElabErrorKind::CompileTimeEval(CompileTimeEvalError::InvalidAssignTarget(..))
		));

		let err = scope.assign(&out, &Value::Str("x".into()), None, &[]).unwrap_err();
		assert!(matches!(
			err.kind,
			crate::elab::ElabErrorKind::CompileTimeEval(CompileTimeEvalError::InvalidAssignValue(..))
		));

		let err = scope.assert_(&Value::Int(1), None, &[]).unwrap_err();
		assert!(matches!(
			err.kind,
			crate::elab::ElabErrorKind::CompileTimeEval(CompileTimeEvalError::InvalidAssertValue(..))
		));

		let err = scope.return_(&out, None).unwrap_err();
		assert!(matches!(
			err.kind,
			crate::elab::ElabErrorKind::SyntaxRestriction(SyntaxRestriction::ReturnOutsideFunction)
		));
	}

	#[test]
	fn test_semantic_failure_location() {
		let (_design, generator, _env) = block_env();
		let mut scope = Scope::new(generator.clone(), "top.py");
		let out = Value::var(generator.get_var("out").unwrap());
		let x = Value::var(generator.get_var("x").unwrap());

		let err = scope.assign(&out, &x, Some(13), &[]).unwrap_err();
		assert!(matches!(
			err.kind,
			crate::elab::ElabErrorKind::Semantic(DesignError::WidthMismatch(..))
		));
		assert_eq!(err.location, Some(SourceRef::new("top.py", 13)));
		assert!(scope.statements().is_empty());
	}

	#[test]
	fn test_captured_locals() {
		let (design, generator, _env) = block_env();
		let y = Value::var(generator.get_var("y").unwrap());
		let mut scope = Scope::new(generator.clone(), "top.py")
			.with_captured_locals(vec![("n".into(), Value::Int(3)), ("sig".into(), y.clone())]);
		let out = Value::var(generator.get_var("out").unwrap());

		let stmt = scope.assign(&out, &y, None, &[]).unwrap();
		let stmt = design.get_statement(stmt).unwrap();
		assert!(stmt.fn_ln.is_empty());

		let n = stmt.scope_variable("n").unwrap();
		assert_eq!((n.value.as_str(), n.is_var), ("3", false));
		let sig = stmt.scope_variable("sig").unwrap();
		assert_eq!((sig.value.as_str(), sig.is_var), ("y", true));
	}

	#[test]
	fn test_assert_captured_locals() {
		let (design, generator, _env) = block_env();
		let a = Value::var(generator.get_var("a").unwrap());
		let mut scope = Scope::new(generator.clone(), "top.py")
			.with_debug(true)
			.with_captured_locals(vec![("n".into(), Value::Int(3))]);

		let stmt = scope.assert_(&a, Some(12), &[("i".into(), Value::Int(1))]).unwrap();
		let stmt = design.get_statement(stmt).unwrap();
		assert_eq!(stmt.fn_ln, vec![SourceRef::new("top.py", 12)]);
		assert_eq!(stmt.scope_variable("n").unwrap().value, "3");
		assert_eq!(stmt.scope_variable("i").unwrap().value, "1");
	}

	#[test]
	fn test_captured_locals_skip_non_scalars() {
		let (design, generator, _env) = block_env();
		let y = Value::var(generator.get_var("y").unwrap());
		let out = Value::var(generator.get_var("out").unwrap());
		let mut scope = Scope::new(generator.clone(), "top.py").with_captured_locals(vec![
			("name".into(), Value::Str("top".into())),
			("flag".into(), Value::Bool(true)),
			("cfg".into(), Value::Namespace(Default::default())),
			("xs".into(), Value::List(vec![Value::Int(1)])),
			("missing".into(), Value::Unresolved),
			("pending".into(), Value::Signal(Signal::Deferred)),
		]);

		let stmt = scope.assign(&out, &y, None, &[]).unwrap();
		let stmt = design.get_statement(stmt).unwrap();
		assert_eq!(stmt.scope_variable("name").unwrap().value, "top");
		assert!(stmt.scope_variable("flag").is_some());
		for name in ["cfg", "xs", "missing", "pending"] {
			assert!(stmt.scope_variable(name).is_none(), "{name} should not be recorded");
		}
	}

	#[test]
	fn test_else_failure_location() {
		let (design, generator, _env) = block_env();
		let mut scope = Scope::new(generator.clone(), "top.py");
		let s = generator.get_var("s").unwrap();
		let out = Value::var(generator.get_var("out").unwrap());
		let test = Value::var(design.equals(s, Operand::Int(1)).unwrap());

		let stmt = scope.assign(&out, &Value::Int(1), Some(12), &[]).unwrap();
		let handle = scope.if_(&test, [stmt], Some(11), &[]).unwrap();
		let err = handle.else_([stmt], Some(14)).err().unwrap();
		assert!(matches!(
			err.kind,
			crate::elab::ElabErrorKind::Semantic(DesignError::StatementAlreadyOwned(..))
		));
		assert_eq!(err.location, Some(SourceRef::new("top.py", 14)));
	}
}
