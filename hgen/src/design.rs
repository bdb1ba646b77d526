pub mod design_error;
pub mod generator;
pub mod statement;
pub mod utils;
pub mod variable;

pub use design_error::{DesignError, VariableNameConflictError, WidthMismatchError};
pub use generator::{Function, FunctionHandle, Generator, GeneratorHandle};
pub use statement::{Branch, ScopeVariable, SourceRef, Statement, StatementBlock, StatementKind};
pub use variable::{BinaryOp, Operand, PortDirection, UnaryOp, VarKind, Variable};

use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

/// References a generator in a design
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub struct GeneratorId {
	id: usize,
}

/// References a function in a design
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub struct FunctionId {
	id: usize,
}

/// References a variable in a design
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct VarId {
	id: usize,
}

/// References a statement in a design
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct StmtId {
	id: usize,
}

/// Core part of the design representation.
/// Referred to via handles with reference counting.
pub struct DesignCore {
	generators: Vec<Generator>,
	functions: Vec<Function>,
	variables: Vec<Variable>,
	statements: Vec<Statement>,
}

impl DesignCore {
	/// Creates a new empty design
	fn new() -> Self {
		Self {
			generators: Vec::new(),
			functions: Vec::new(),
			variables: Vec::new(),
			statements: Vec::new(),
		}
	}

	fn generator(&self, id: GeneratorId) -> &Generator {
		&self.generators[id.id - 1]
	}

	fn generator_mut(&mut self, id: GeneratorId) -> &mut Generator {
		&mut self.generators[id.id - 1]
	}

	fn function(&self, id: FunctionId) -> &Function {
		&self.functions[id.id - 1]
	}

	fn function_mut(&mut self, id: FunctionId) -> &mut Function {
		&mut self.functions[id.id - 1]
	}

	fn variable(&self, id: VarId) -> &Variable {
		&self.variables[id.id - 1]
	}

	fn variable_mut(&mut self, id: VarId) -> &mut Variable {
		&mut self.variables[id.id - 1]
	}

	fn statement(&self, id: StmtId) -> &Statement {
		&self.statements[id.id - 1]
	}

	fn statement_mut(&mut self, id: StmtId) -> &mut Statement {
		&mut self.statements[id.id - 1]
	}

	fn new_generator(&mut self, name: &str) -> Result<GeneratorId, DesignError> {
		if !utils::is_name_valid(name) {
			return Err(DesignError::InvalidName(name.to_string()));
		}

		if self.generators.iter().any(|g| g.name == name) {
			return Err(DesignError::GeneratorNameConflict(name.to_string()));
		}

		let mut generator = Generator::new(name);
		generator.id = GeneratorId {
			id: self.generators.len() + 1,
		};
		let id = generator.id;
		self.generators.push(generator);
		debug!("New generator '{}' ({:?})", name, id);
		Ok(id)
	}

	fn new_function(&mut self, generator: GeneratorId, name: &str) -> Result<FunctionId, DesignError> {
		if !utils::is_name_valid(name) {
			return Err(DesignError::InvalidName(name.to_string()));
		}

		let conflict = self
			.generator(generator)
			.functions
			.iter()
			.any(|f| self.function(*f).name == name);
		if conflict {
			return Err(DesignError::FunctionNameConflict(name.to_string()));
		}

		let mut function = Function::new(generator, name);
		function.id = FunctionId {
			id: self.functions.len() + 1,
		};
		let id = function.id;
		self.functions.push(function);
		self.generator_mut(generator).functions.push(id);
		Ok(id)
	}

	fn push_variable(&mut self, mut var: Variable) -> VarId {
		var.id = VarId {
			id: self.variables.len() + 1,
		};
		let id = var.id;
		self.variables.push(var);
		id
	}

	/// Adds a named variable to a generator (or function)
	///
	/// Performs check for conflicting variable names.
	fn new_base_variable(
		&mut self,
		generator: GeneratorId,
		function: Option<FunctionId>,
		name: &str,
		width: u32,
		signed: bool,
		direction: PortDirection,
	) -> Result<VarId, DesignError> {
		if !utils::is_name_valid(name) {
			return Err(DesignError::InvalidName(name.to_string()));
		}

		if width == 0 {
			return Err(DesignError::InvalidWidth);
		}

		let siblings = match function {
			Some(f) => &self.function(f).inputs,
			None => &self.generator(generator).variables,
		};
		if siblings.iter().any(|v| self.variable(*v).name == name) {
			return Err(VariableNameConflictError {
				generator,
				function,
				name: name.to_string(),
			}
			.into());
		}

		let id = self.push_variable(Variable {
			id: VarId { id: 0 },
			generator: Some(generator),
			function,
			name: name.to_string(),
			width,
			signed,
			kind: VarKind::Base { direction },
			fn_ln: vec![],
		});

		if function.is_none() {
			self.generator_mut(generator).variables.push(id);
		}
		Ok(id)
	}

	fn new_constant(&mut self, value: i64, width: u32, signed: bool) -> Result<VarId, DesignError> {
		if !utils::constant_fits(value, width, signed) {
			return Err(DesignError::ConstantOutOfRange { value, width });
		}

		Ok(self.push_variable(Variable {
			id: VarId { id: 0 },
			generator: None,
			function: None,
			name: value.to_string(),
			width,
			signed,
			kind: VarKind::Constant { value },
			fn_ln: vec![],
		}))
	}

	/// Converts an operand into a variable. Plain integers become constants
	/// with the width and signedness of the reference variable.
	fn resolve_operand(&mut self, operand: Operand, like: VarId) -> Result<VarId, DesignError> {
		match operand {
			Operand::Var(var) => Ok(var),
			Operand::Int(value) => {
				let reference = self.variable(like);
				let (width, signed) = (reference.width, reference.signed);
				self.new_constant(value, width, signed)
			},
		}
	}

	fn new_slice(&mut self, parent: VarId, hi: i64, lo: i64) -> Result<VarId, DesignError> {
		let var = self.variable(parent);
		if lo < 0 || hi < lo || hi >= var.width as i64 {
			return Err(DesignError::InvalidSlice {
				name: var.name.clone(),
				hi,
				lo,
			});
		}

		let name = match hi == lo {
			true => format!("{}[{}]", var.name, hi),
			false => format!("{}[{}:{}]", var.name, hi, lo),
		};
		let generator = var.generator;
		Ok(self.push_variable(Variable {
			id: VarId { id: 0 },
			generator,
			function: None,
			name,
			width: (hi - lo + 1) as u32,
			signed: false,
			kind: VarKind::Slice {
				parent,
				hi: hi as u32,
				lo: lo as u32,
			},
			fn_ln: vec![],
		}))
	}

	fn new_bit_select(&mut self, parent: VarId, index: i64) -> Result<VarId, DesignError> {
		let var = self.variable(parent);
		if index < 0 || index >= var.width as i64 {
			return Err(DesignError::IndexOutOfRange {
				name: var.name.clone(),
				index,
				width: var.width,
			});
		}
		self.new_slice(parent, index, index)
	}

	fn new_binary(&mut self, op: BinaryOp, lhs: Operand, rhs: Operand) -> Result<VarId, DesignError> {
		let (lhs, rhs) = match (lhs, rhs) {
			(Operand::Int(_), Operand::Int(_)) => return Err(DesignError::NoVariableOperand),
			(Operand::Var(l), r) => (l, self.resolve_operand(r, l)?),
			(l, Operand::Var(r)) => (self.resolve_operand(l, r)?, r),
		};

		let (l, r) = (self.variable(lhs), self.variable(rhs));
		if op.requires_matching_widths() && l.width != r.width {
			return Err(WidthMismatchError {
				target: l.name.clone(),
				target_width: l.width,
				source: r.name.clone(),
				source_width: r.width,
			}
			.into());
		}

		let width = match op.is_boolean() {
			true => 1,
			false => l.width,
		};
		let signed = !op.is_boolean() && l.signed && r.signed;
		let name = format!("({} {} {})", l.name, op.symbol(), r.name);
		let generator = l.generator.or(r.generator);

		Ok(self.push_variable(Variable {
			id: VarId { id: 0 },
			generator,
			function: None,
			name,
			width,
			signed,
			kind: VarKind::Binary { op, lhs, rhs },
			fn_ln: vec![],
		}))
	}

	fn new_unary(&mut self, op: UnaryOp, operand: VarId) -> VarId {
		let var = self.variable(operand);
		let width = match op {
			UnaryOp::LogicalNot => 1,
			_ => var.width,
		};
		let variable = Variable {
			id: VarId { id: 0 },
			generator: var.generator,
			function: None,
			name: format!("{}{}", op.symbol(), var.name),
			width,
			signed: var.signed && op != UnaryOp::LogicalNot,
			kind: VarKind::Unary { op, operand },
			fn_ln: vec![],
		};
		self.push_variable(variable)
	}

	fn push_statement(&mut self, mut stmt: Statement) -> StmtId {
		stmt.id = StmtId {
			id: self.statements.len() + 1,
		};
		let id = stmt.id;
		self.statements.push(stmt);
		id
	}

	/// Checks whether a variable (or the variable it slices) can be driven
	fn is_assignable(&self, var: VarId) -> bool {
		match &self.variable(var).kind {
			VarKind::Base { direction } => *direction != PortDirection::Input,
			VarKind::Slice { parent, .. } => self.is_assignable(*parent),
			_ => false,
		}
	}

	fn new_assign(&mut self, lhs: VarId, rhs: Operand) -> Result<StmtId, DesignError> {
		if !self.is_assignable(lhs) {
			return Err(DesignError::NotAssignable(self.variable(lhs).name.clone()));
		}

		let rhs = self.resolve_operand(rhs, lhs)?;
		let (l, r) = (self.variable(lhs), self.variable(rhs));
		if l.width != r.width {
			return Err(WidthMismatchError {
				target: l.name.clone(),
				target_width: l.width,
				source: r.name.clone(),
				source_width: r.width,
			}
			.into());
		}

		Ok(self.push_statement(Statement::new(StatementKind::Assign { lhs, rhs })))
	}

	fn new_return(&mut self, function: FunctionId, value: Operand) -> Result<StmtId, DesignError> {
		let return_width = self.function(function).return_width;
		let value = match (value, return_width) {
			(Operand::Var(var), _) => var,
			(Operand::Int(value), Some(width)) => self.new_constant(value, width, value < 0)?,
			(Operand::Int(value), None) => self.new_constant(value, utils::min_width(value), value < 0)?,
		};

		let width = self.variable(value).width;
		match return_width {
			Some(expected) if expected != width => {
				return Err(WidthMismatchError {
					target: self.function(function).name.clone(),
					target_width: expected,
					source: self.variable(value).name.clone(),
					source_width: width,
				}
				.into());
			},
			Some(_) => (),
			None => self.function_mut(function).return_width = Some(width),
		}

		Ok(self.push_statement(Statement::new(StatementKind::Return { function, value })))
	}

	fn add_to_body(&mut self, stmt: StmtId, branch: Branch, child: StmtId) -> Result<(), DesignError> {
		if !self.statement(stmt).is_conditional() {
			return Err(DesignError::NotAConditional(stmt));
		}

		if self.statement(child).parent.is_some() || child == stmt {
			return Err(DesignError::StatementAlreadyOwned(child));
		}

		self.statement_mut(child).parent = Some(stmt);
		if let Some(body) = self.statement_mut(stmt).body_mut(branch) {
			body.stmts.push(child);
		}
		Ok(())
	}
}

/// Strong reference to a design
pub type DesignHandle = Rc<RefCell<DesignCore>>;

/// Represents a hardware design - the container of all generators,
/// variables and statements. Cloning yields another handle to the same design.
#[derive(Clone)]
pub struct Design {
	handle: DesignHandle,
}

impl Default for Design {
	fn default() -> Self {
		Self::new()
	}
}

impl Design {
	/// Creates a new empty design
	pub fn new() -> Self {
		Self {
			handle: Rc::new(RefCell::new(DesignCore::new())),
		}
	}

	fn borrow_mut(&self) -> std::cell::RefMut<DesignCore> {
		self.handle.borrow_mut()
	}

	fn borrow(&self) -> std::cell::Ref<DesignCore> {
		self.handle.borrow()
	}

	pub fn handle(&self) -> DesignHandle {
		self.handle.clone()
	}

	/// Creates a new generator with provided name and returns a handle to it
	pub fn new_generator(&self, name: &str) -> Result<GeneratorHandle, DesignError> {
		let id = self.borrow_mut().new_generator(name)?;
		Ok(GeneratorHandle::new(self.clone(), id))
	}

	pub fn get_variable(&self, var: VarId) -> Option<Variable> {
		self.borrow().variables.get(var.id.wrapping_sub(1)).cloned()
	}

	pub fn get_statement(&self, stmt: StmtId) -> Option<Statement> {
		self.borrow().statements.get(stmt.id.wrapping_sub(1)).cloned()
	}

	pub fn get_function(&self, function: FunctionId) -> Option<Function> {
		self.borrow().functions.get(function.id.wrapping_sub(1)).cloned()
	}

	/// Returns name of a variable (rendered expression for derived variables)
	pub fn var_name(&self, var: VarId) -> String {
		self.borrow().variable(var).name.clone()
	}

	pub fn var_width(&self, var: VarId) -> u32 {
		self.borrow().variable(var).width
	}

	/// Creates a constant variable
	pub fn constant(&self, value: i64, width: u32, signed: bool) -> Result<VarId, DesignError> {
		self.borrow_mut().new_constant(value, width, signed)
	}

	/// Creates the single-bit false constant
	pub fn false_constant(&self) -> VarId {
		self.borrow_mut().push_variable(Variable {
			id: VarId { id: 0 },
			generator: None,
			function: None,
			name: "0".to_string(),
			width: 1,
			signed: false,
			kind: VarKind::Constant { value: 0 },
			fn_ln: vec![],
		})
	}

	/// Selects a single bit of a variable
	pub fn bit_select(&self, var: VarId, index: i64) -> Result<VarId, DesignError> {
		self.borrow_mut().new_bit_select(var, index)
	}

	/// Selects a bit range of a variable (both ends inclusive)
	pub fn slice(&self, var: VarId, hi: i64, lo: i64) -> Result<VarId, DesignError> {
		self.borrow_mut().new_slice(var, hi, lo)
	}

	pub fn binary(&self, op: BinaryOp, lhs: Operand, rhs: Operand) -> Result<VarId, DesignError> {
		self.borrow_mut().new_binary(op, lhs, rhs)
	}

	pub fn unary(&self, op: UnaryOp, operand: VarId) -> VarId {
		self.borrow_mut().new_unary(op, operand)
	}

	/// Equality test producing a single-bit variable
	pub fn equals(&self, lhs: VarId, rhs: Operand) -> Result<VarId, DesignError> {
		self.binary(BinaryOp::Equal, lhs.into(), rhs)
	}

	/// Logical AND of two variables
	pub fn and_reduce(&self, lhs: VarId, rhs: Operand) -> Result<VarId, DesignError> {
		self.binary(BinaryOp::LogicalAnd, lhs.into(), rhs)
	}

	/// Logical OR of two variables
	pub fn or_reduce(&self, lhs: VarId, rhs: Operand) -> Result<VarId, DesignError> {
		self.binary(BinaryOp::LogicalOr, lhs.into(), rhs)
	}

	/// Logical negation of a variable
	pub fn negate(&self, var: VarId) -> VarId {
		self.unary(UnaryOp::LogicalNot, var)
	}

	/// Builds an assignment statement
	pub fn assign(&self, lhs: VarId, rhs: Operand) -> Result<StmtId, DesignError> {
		self.borrow_mut().new_assign(lhs, rhs)
	}

	/// Builds a conditional statement with empty branches
	pub fn if_stmt(&self, predicate: VarId) -> StmtId {
		self.borrow_mut().push_statement(Statement::new(StatementKind::If {
			predicate,
			then_body: StatementBlock::default(),
			else_body: StatementBlock::default(),
		}))
	}

	/// Builds an assertion statement
	pub fn assert_stmt(&self, value: VarId) -> StmtId {
		self.borrow_mut()
			.push_statement(Statement::new(StatementKind::Assert { value }))
	}

	pub fn add_then_stmt(&self, if_stmt: StmtId, stmt: StmtId) -> Result<(), DesignError> {
		self.borrow_mut().add_to_body(if_stmt, Branch::Then, stmt)
	}

	pub fn add_else_stmt(&self, if_stmt: StmtId, stmt: StmtId) -> Result<(), DesignError> {
		self.borrow_mut().add_to_body(if_stmt, Branch::Else, stmt)
	}

	/// Attaches a source location to a statement
	pub fn add_stmt_fn_ln(&self, stmt: StmtId, loc: SourceRef) {
		self.borrow_mut().statement_mut(stmt).fn_ln.push(loc);
	}

	/// Attaches a source location to a branch body of a conditional statement
	pub fn add_body_fn_ln(&self, stmt: StmtId, branch: Branch, loc: SourceRef) -> Result<(), DesignError> {
		let mut core = self.borrow_mut();
		let body = core
			.statement_mut(stmt)
			.body_mut(branch)
			.ok_or(DesignError::NotAConditional(stmt))?;
		body.fn_ln.push(loc);
		Ok(())
	}

	/// Attaches a source location to a variable
	pub fn add_var_fn_ln(&self, var: VarId, loc: SourceRef) {
		self.borrow_mut().variable_mut(var).fn_ln.push(loc);
	}

	/// Attaches a named debug value to a statement
	pub fn add_scope_variable(&self, stmt: StmtId, name: &str, value: &str, is_var: bool) {
		self.borrow_mut().statement_mut(stmt).scope_vars.push(ScopeVariable {
			name: name.to_string(),
			value: value.to_string(),
			is_var,
		});
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn design_basic_test() -> Result<(), DesignError> {
		let d = Design::new();
		let g = d.new_generator("top")?;
		let a = g.input("a", 4, false)?;
		let b = g.var("b", 4, false)?;

		let sum = d.binary(BinaryOp::Add, a.into(), 1.into())?;
		assert_eq!(d.var_name(sum), "(a + 1)");
		assert_eq!(d.var_width(sum), 4);

		let stmt = d.assign(b, sum.into())?;
		let stmt = d.get_statement(stmt).unwrap();
		assert!(matches!(stmt.kind, StatementKind::Assign { lhs, .. } if lhs == b));
		Ok(())
	}

	/// Verifies if the design correctly detects variable name conflicts
	#[test]
	fn test_unique_variable_names() -> Result<(), DesignError> {
		let d = Design::new();
		let g = d.new_generator("top")?;
		g.var("name", 1, false)?;
		let second = g.var("name", 2, false);
		assert!(matches!(second, Err(DesignError::VariableNameConflict(..))));
		Ok(())
	}

	/// Verifies if the design enforces unique generator names
	#[test]
	fn test_unique_generator_names() -> Result<(), DesignError> {
		let d = Design::new();
		let _g = d.new_generator("name")?;
		assert!(matches!(
			d.new_generator("name"),
			Err(DesignError::GeneratorNameConflict(..))
		));
		assert!(matches!(d.new_generator("1bad"), Err(DesignError::InvalidName(..))));
		Ok(())
	}

	#[test]
	fn test_assign_width_mismatch() -> Result<(), DesignError> {
		let d = Design::new();
		let g = d.new_generator("top")?;
		let a = g.var("a", 4, false)?;
		let b = g.var("b", 2, false)?;
		assert!(matches!(d.assign(a, b.into()), Err(DesignError::WidthMismatch(..))));
		assert!(matches!(
			d.assign(b, 7.into()),
			Err(DesignError::ConstantOutOfRange { value: 7, width: 2 })
		));
		Ok(())
	}

	#[test]
	fn test_assign_to_input() -> Result<(), DesignError> {
		let d = Design::new();
		let g = d.new_generator("top")?;
		let a = g.input("a", 1, false)?;
		assert!(matches!(d.assign(a, 1.into()), Err(DesignError::NotAssignable(..))));

		let sum = d.binary(BinaryOp::BitwiseOr, a.into(), 0.into())?;
		assert!(matches!(d.assign(sum, 1.into()), Err(DesignError::NotAssignable(..))));
		Ok(())
	}

	#[test]
	fn test_slices() -> Result<(), DesignError> {
		let d = Design::new();
		let g = d.new_generator("top")?;
		let x = g.output("x", 8, false)?;

		let bit = d.bit_select(x, 3)?;
		assert_eq!(d.var_name(bit), "x[3]");
		assert_eq!(d.var_width(bit), 1);

		let range = d.slice(x, 7, 4)?;
		assert_eq!(d.var_name(range), "x[7:4]");
		assert_eq!(d.var_width(range), 4);

		assert!(matches!(d.bit_select(x, 8), Err(DesignError::IndexOutOfRange { .. })));
		assert!(matches!(d.slice(x, 2, 5), Err(DesignError::InvalidSlice { .. })));

		// Slices of outputs can be driven
		d.assign(bit, 1.into())?;
		Ok(())
	}

	#[test]
	fn test_conditional_bodies() -> Result<(), DesignError> {
		let d = Design::new();
		let g = d.new_generator("top")?;
		let s = g.input("s", 2, false)?;
		let out = g.var("out", 1, false)?;

		let test = d.equals(s, 3.into())?;
		assert_eq!(d.var_name(test), "(s == 3)");

		let cond = d.if_stmt(test);
		let then_stmt = d.assign(out, 1.into())?;
		let else_stmt = d.assign(out, 0.into())?;
		d.add_then_stmt(cond, then_stmt)?;
		d.add_else_stmt(cond, else_stmt)?;

		// A statement can only be owned once
		assert!(matches!(
			d.add_else_stmt(cond, then_stmt),
			Err(DesignError::StatementAlreadyOwned(..))
		));
		assert!(matches!(
			d.add_then_stmt(then_stmt, else_stmt),
			Err(DesignError::NotAConditional(..))
		));

		let cond = d.get_statement(cond).unwrap();
		assert_eq!(cond.body(Branch::Then).unwrap().stmts, vec![then_stmt]);
		assert_eq!(cond.body(Branch::Else).unwrap().stmts, vec![else_stmt]);
		assert_eq!(d.get_statement(then_stmt).unwrap().parent(), Some(cond.id()));
		Ok(())
	}

	#[test]
	fn test_logic_reductions() -> Result<(), DesignError> {
		let d = Design::new();
		let g = d.new_generator("top")?;
		let a = g.var("a", 1, false)?;
		let b = g.var("b", 1, false)?;
		let c = g.var("c", 1, false)?;

		let ab = d.and_reduce(a, b.into())?;
		let abc = d.or_reduce(ab, c.into())?;
		let not_abc = d.negate(abc);
		assert_eq!(d.var_name(not_abc), "!((a && b) || c)");
		assert_eq!(d.var_width(not_abc), 1);
		Ok(())
	}

	#[test]
	fn test_functions() -> Result<(), DesignError> {
		let d = Design::new();
		let g = d.new_generator("top")?;
		let f = g.function("add_one")?;
		let a = f.input("a", 4, false)?;
		assert_eq!(f.inputs(), vec![a]);

		// Function arguments do not clash with generator variables
		g.var("a", 2, false)?;
		assert!(matches!(f.input("a", 4, false), Err(DesignError::VariableNameConflict(..))));

		let sum = d.binary(BinaryOp::Add, a.into(), 1.into())?;
		f.return_stmt(sum.into())?;
		f.return_stmt(0.into())?;
		let narrow = g.var("narrow", 2, false)?;
		assert!(matches!(f.return_stmt(narrow.into()), Err(DesignError::WidthMismatch(..))));

		assert!(matches!(g.function("add_one"), Err(DesignError::FunctionNameConflict(..))));
		Ok(())
	}

	#[test]
	fn test_metadata() -> Result<(), DesignError> {
		let d = Design::new();
		let g = d.new_generator("top")?;
		let a = g.var("a", 1, false)?;
		let stmt = d.assign(a, 1.into())?;
		d.add_stmt_fn_ln(stmt, SourceRef::new("top.py", 12));
		d.add_scope_variable(stmt, "i", "3", false);
		assert!(matches!(
			d.add_body_fn_ln(stmt, Branch::Then, SourceRef::new("top.py", 12)),
			Err(DesignError::NotAConditional(..))
		));

		let stmt = d.get_statement(stmt).unwrap();
		assert_eq!(stmt.fn_ln, vec![SourceRef::new("top.py", 12)]);
		assert_eq!(stmt.scope_variable("i").map(|v| v.value.as_str()), Some("3"));
		Ok(())
	}
}
