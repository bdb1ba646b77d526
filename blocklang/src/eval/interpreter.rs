use super::eval_error::{CompileTimeEvalError, EvalError};
use super::value::{Environment, Signal, Value};
use crate::syntax::{BinOpKind, BoolOpKind, CompareOp, NodeId, NodeKind, SyntaxTree, UnaryOpKind};
use hgen::{BinaryOp, Design, Operand, UnaryOp};
use log::trace;

/// Default upper bound for the length of sequences produced by `range()`
pub const DEFAULT_SEQUENCE_LIMIT: usize = 65536;

/// Evaluates expressions of the block sub-language against an explicit environment.
///
/// A probing interpreter never touches the design. Signal-valued expressions
/// evaluate to `Signal::Deferred` and only the host-level parts are checked.
/// A building interpreter constructs the design variables for signal-valued expressions.
pub struct Interpreter<'a> {
	tree: &'a SyntaxTree,
	env: &'a Environment,
	design: Option<&'a Design>,
	sequence_limit: usize,
}

fn fail<T>(err: CompileTimeEvalError) -> Result<T, EvalError> {
	Err(err.into())
}

fn signal_binary_op(op: BinOpKind) -> BinaryOp {
	use BinOpKind::*;
	match op {
		Add => BinaryOp::Add,
		Sub => BinaryOp::Subtract,
		Mult => BinaryOp::Multiply,
		FloorDiv => BinaryOp::Divide,
		Mod => BinaryOp::Modulo,
		LShift => BinaryOp::ShiftLeft,
		RShift => BinaryOp::ShiftRight,
		BitAnd => BinaryOp::BitwiseAnd,
		BitOr => BinaryOp::BitwiseOr,
		BitXor => BinaryOp::BitwiseXor,
	}
}

fn signal_compare_op(op: CompareOp) -> BinaryOp {
	use CompareOp::*;
	match op {
		Eq => BinaryOp::Equal,
		NotEq => BinaryOp::NotEqual,
		Lt => BinaryOp::Less,
		LtE => BinaryOp::LessEqual,
		Gt => BinaryOp::Greater,
		GtE => BinaryOp::GreaterEqual,
	}
}

/// Integer division rounding towards negative infinity
fn floor_div(a: i64, b: i64) -> Option<i64> {
	let q = a.checked_div(b)?;
	if a % b != 0 && ((a < 0) != (b < 0)) {
		q.checked_sub(1)
	}
	else {
		Some(q)
	}
}

/// Remainder with the sign of the divisor
fn floor_mod(a: i64, b: i64) -> Option<i64> {
	let r = a.checked_rem(b)?;
	if r != 0 && ((r < 0) != (b < 0)) {
		r.checked_add(b)
	}
	else {
		Some(r)
	}
}

/// Resolves a possibly negative index into a sequence of given length
fn sequence_index(index: i64, len: usize) -> Result<usize, EvalError> {
	let resolved = if index < 0 { index + len as i64 } else { index };
	if resolved < 0 || resolved >= len as i64 {
		return fail(CompileTimeEvalError::IndexOutOfRange { index, len });
	}
	Ok(resolved as usize)
}

impl<'a> Interpreter<'a> {
	/// Creates an interpreter which classifies expressions without constructing anything
	pub fn probe(tree: &'a SyntaxTree, env: &'a Environment) -> Self {
		Self {
			tree,
			env,
			design: None,
			sequence_limit: DEFAULT_SEQUENCE_LIMIT,
		}
	}

	/// Creates an interpreter which constructs signal expressions in the design
	pub fn build(tree: &'a SyntaxTree, env: &'a Environment, design: &'a Design) -> Self {
		Self {
			tree,
			env,
			design: Some(design),
			sequence_limit: DEFAULT_SEQUENCE_LIMIT,
		}
	}

	pub fn with_sequence_limit(mut self, limit: usize) -> Self {
		self.sequence_limit = limit;
		self
	}

	/// Evaluates an expression
	pub fn eval(&self, node: NodeId) -> Result<Value, EvalError> {
		let value = match self.tree.kind(node) {
			NodeKind::Int { value } => Value::Int(*value),
			NodeKind::Str { value } => Value::Str(value.clone()),
			NodeKind::Bool { value } => Value::Bool(*value),
			NodeKind::Name { id } => self.lookup(id)?,
			NodeKind::Attribute { value, attr } => self.eval_attribute(*value, attr)?,
			NodeKind::Subscript { value, index } => self.eval_subscript(node, *value, *index)?,
			NodeKind::Call { func, args } => self.eval_call(node, *func, args)?,
			NodeKind::BinOp { op, left, right } => {
				let (lhs, rhs) = (self.eval(*left)?, self.eval(*right)?);
				if lhs.is_signal() || rhs.is_signal() {
					self.signal_binary(node, signal_binary_op(*op), &lhs, &rhs)?
				}
				else {
					self.host_binary(node, *op, &lhs, &rhs)?
				}
			},
			NodeKind::Compare { op, left, right } => {
				let (lhs, rhs) = (self.eval(*left)?, self.eval(*right)?);
				if lhs.is_signal() || rhs.is_signal() {
					self.signal_binary(node, signal_compare_op(*op), &lhs, &rhs)?
				}
				else {
					self.host_compare(node, *op, &lhs, &rhs)?
				}
			},
			NodeKind::UnaryOp { op, operand } => {
				let value = self.eval(*operand)?;
				match value {
					Value::Signal(signal) => self.signal_unary(node, *op, signal)?,
					_ => self.host_unary(node, *op, &value)?,
				}
			},
			NodeKind::BoolOp { op, values } => self.host_bool_op(*op, values)?,
			NodeKind::Tuple { elts } | NodeKind::List { elts } => {
				Value::List(elts.iter().map(|e| self.eval(*e)).collect::<Result<_, _>>()?)
			},
			_ => return fail(CompileTimeEvalError::UnsupportedExpression(self.tree.render(node))),
		};

		trace!("Evaluated '{}' to {}", self.tree.render(node), value);
		Ok(value)
	}

	/// Evaluates an expression which must produce an integer known at compile time
	pub fn eval_int(&self, node: NodeId) -> Result<i64, EvalError> {
		match self.eval(node)? {
			Value::Int(value) => Ok(value),
			Value::Signal(_) => fail(CompileTimeEvalError::SignalInHostContext(self.tree.render(node))),
			other => fail(CompileTimeEvalError::InvalidOperands {
				expression: self.tree.render(node),
				reason: format!("expected an integer, got a {}", other.type_name()),
			}),
		}
	}

	fn lookup(&self, name: &str) -> Result<Value, EvalError> {
		match self.env.get(name) {
			None => fail(CompileTimeEvalError::UndefinedName(name.into())),
			Some(Value::Unresolved) => fail(CompileTimeEvalError::UnresolvedName(name.into())),
			Some(value) => Ok(value.clone()),
		}
	}

	fn eval_attribute(&self, base: NodeId, attr: &str) -> Result<Value, EvalError> {
		let no_attribute = || {
			fail(CompileTimeEvalError::NoSuchAttribute {
				expression: self.tree.render(base),
				attr: attr.into(),
			})
		};

		match self.eval(base)? {
			Value::Namespace(fields) => match fields.get(attr) {
				Some(Value::Unresolved) => fail(CompileTimeEvalError::UnresolvedName(attr.into())),
				Some(value) => Ok(value.clone()),
				None => no_attribute(),
			},
			_ => no_attribute(),
		}
	}

	fn eval_subscript(&self, node: NodeId, base: NodeId, index: NodeId) -> Result<Value, EvalError> {
		let value = self.eval(base)?;
		match value {
			Value::Signal(signal) => match self.tree.kind(index) {
				NodeKind::Tuple { elts } if elts.len() == 2 => {
					let (hi, lo) = (self.eval_int(elts[0])?, self.eval_int(elts[1])?);
					self.with_design(node, signal, |design, var| design.slice(var, hi, lo))
				},
				_ => {
					let bit = self.eval_int(index)?;
					self.with_design(node, signal, |design, var| design.bit_select(var, bit))
				},
			},
			Value::List(values) => {
				let index = sequence_index(self.eval_int(index)?, values.len())?;
				Ok(values[index].clone())
			},
			Value::Str(text) => {
				let chars: Vec<char> = text.chars().collect();
				let index = sequence_index(self.eval_int(index)?, chars.len())?;
				Ok(Value::Str(chars[index].to_string()))
			},
			other => fail(CompileTimeEvalError::InvalidOperands {
				expression: self.tree.render(node),
				reason: format!("a {} cannot be indexed", other.type_name()),
			}),
		}
	}

	fn eval_call(&self, node: NodeId, func: NodeId, args: &[NodeId]) -> Result<Value, EvalError> {
		match self.tree.kind(func) {
			NodeKind::Name { id } if id == "range" => self.eval_range(node, args),
			NodeKind::Name { id } if id == "len" && args.len() == 1 => match self.eval(args[0])? {
				Value::List(values) => Ok(Value::Int(values.len() as i64)),
				Value::Str(text) => Ok(Value::Int(text.chars().count() as i64)),
				Value::Signal(_) => fail(CompileTimeEvalError::SignalInHostContext(self.tree.render(args[0]))),
				other => fail(CompileTimeEvalError::InvalidOperands {
					expression: self.tree.render(node),
					reason: format!("a {} has no length", other.type_name()),
				}),
			},
			NodeKind::Attribute { value, attr } => self.eval_method(node, *value, attr, args),
			_ => fail(CompileTimeEvalError::UnsupportedExpression(self.tree.render(node))),
		}
	}

	/// Reduction methods available on signals
	fn eval_method(&self, node: NodeId, base: NodeId, method: &str, args: &[NodeId]) -> Result<Value, EvalError> {
		let op = match (method, args.len()) {
			("eq", 1) => Some(BinaryOp::Equal),
			("and_", 1) => Some(BinaryOp::LogicalAnd),
			("or_", 1) => Some(BinaryOp::LogicalOr),
			("r_not", 0) => None,
			_ => return fail(CompileTimeEvalError::UnsupportedExpression(self.tree.render(node))),
		};

		let value = self.eval(base)?;
		let Value::Signal(signal) = value
		else {
			return fail(CompileTimeEvalError::InvalidOperands {
				expression: self.tree.render(node),
				reason: format!("'{}' is only available on signals, got a {}", method, value.type_name()),
			});
		};

		match op {
			Some(op) => {
				let rhs = self.eval(args[0])?;
				self.signal_binary(node, op, &value, &rhs)
			},
			None => self.with_design(node, signal, |design, var| Ok(design.negate(var))),
		}
	}

	fn eval_range(&self, node: NodeId, args: &[NodeId]) -> Result<Value, EvalError> {
		let args = args.iter().map(|a| self.eval_int(*a)).collect::<Result<Vec<_>, _>>()?;
		let (start, stop, step) = match args[..] {
			[stop] => (0, stop, 1),
			[start, stop] => (start, stop, 1),
			[start, stop, step] => (start, stop, step),
			_ => return fail(CompileTimeEvalError::UnsupportedExpression(self.tree.render(node))),
		};

		if step == 0 {
			return fail(CompileTimeEvalError::InvalidOperands {
				expression: self.tree.render(node),
				reason: "range() step must not be zero".into(),
			});
		}

		let (start, stop, step) = (start as i128, stop as i128, step as i128);
		let span = if step > 0 { stop - start } else { start - stop };
		let count = if span <= 0 { 0 } else { (span + step.abs() - 1) / step.abs() };
		if count > self.sequence_limit as i128 {
			return fail(CompileTimeEvalError::TooManyIterations {
				limit: self.sequence_limit,
			});
		}

		Ok(Value::List(
			(0..count).map(|n| Value::Int((start + n * step) as i64)).collect(),
		))
	}

	/// Runs a design operation on a signal, or defers it when probing
	fn with_design<F>(&self, node: NodeId, signal: Signal, op: F) -> Result<Value, EvalError>
	where
		F: FnOnce(&Design, hgen::VarId) -> Result<hgen::VarId, hgen::DesignError>,
	{
		match (self.design, signal) {
			(None, _) => Ok(Value::Signal(Signal::Deferred)),
			(Some(design), Signal::Var(var)) => Ok(Value::var(op(design, var)?)),
			(Some(_), Signal::Deferred) => fail(CompileTimeEvalError::UnsupportedExpression(self.tree.render(node))),
		}
	}

	/// Converts a value into an operand of a signal expression
	fn operand(&self, node: NodeId, value: &Value) -> Result<Option<Operand>, EvalError> {
		match value {
			Value::Signal(Signal::Var(var)) => Ok(Some(Operand::Var(*var))),
			Value::Signal(Signal::Deferred) => Ok(None),
			Value::Int(v) => Ok(Some(Operand::Int(*v))),
			Value::Bool(v) => Ok(Some(Operand::Int(*v as i64))),
			other => fail(CompileTimeEvalError::InvalidOperands {
				expression: self.tree.render(node),
				reason: format!("a {} cannot be combined with a signal", other.type_name()),
			}),
		}
	}

	fn signal_binary(&self, node: NodeId, op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
		let (lhs, rhs) = (self.operand(node, lhs)?, self.operand(node, rhs)?);
		match (self.design, lhs, rhs) {
			(None, _, _) => Ok(Value::Signal(Signal::Deferred)),
			(Some(design), Some(lhs), Some(rhs)) => Ok(Value::var(design.binary(op, lhs, rhs)?)),
			(Some(_), _, _) => fail(CompileTimeEvalError::UnsupportedExpression(self.tree.render(node))),
		}
	}

	fn signal_unary(&self, node: NodeId, op: UnaryOpKind, signal: Signal) -> Result<Value, EvalError> {
		let op = match op {
			UnaryOpKind::Not => UnaryOp::LogicalNot,
			UnaryOpKind::USub => UnaryOp::Negate,
			UnaryOpKind::Invert => UnaryOp::BitwiseNot,
		};
		self.with_design(node, signal, |design, var| Ok(design.unary(op, var)))
	}

	fn host_binary(&self, node: NodeId, op: BinOpKind, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
		let invalid = |reason: &str| {
			fail(CompileTimeEvalError::InvalidOperands {
				expression: self.tree.render(node),
				reason: reason.into(),
			})
		};

		let (a, b) = match (lhs, rhs) {
			(Value::Int(a), Value::Int(b)) => (*a, *b),
			(Value::Str(a), Value::Str(b)) if op == BinOpKind::Add => return Ok(Value::Str(format!("{}{}", a, b))),
			(Value::List(a), Value::List(b)) if op == BinOpKind::Add => {
				return Ok(Value::List(a.iter().chain(b.iter()).cloned().collect()))
			},
			_ => {
				return invalid(&format!(
					"unsupported operand types {} and {}",
					lhs.type_name(),
					rhs.type_name()
				))
			},
		};

		if matches!(op, BinOpKind::FloorDiv | BinOpKind::Mod) && b == 0 {
			return fail(CompileTimeEvalError::DivisionByZero(self.tree.render(node)));
		}

		if matches!(op, BinOpKind::LShift | BinOpKind::RShift) && !(0..64).contains(&b) {
			return invalid("shift amount out of range");
		}

		use BinOpKind::*;
		let result = match op {
			Add => a.checked_add(b),
			Sub => a.checked_sub(b),
			Mult => a.checked_mul(b),
			FloorDiv => floor_div(a, b),
			Mod => floor_mod(a, b),
			LShift => a.checked_shl(b as u32),
			RShift => a.checked_shr(b as u32),
			BitAnd => Some(a & b),
			BitOr => Some(a | b),
			BitXor => Some(a ^ b),
		};

		match result {
			Some(value) => Ok(Value::Int(value)),
			None => invalid("integer overflow"),
		}
	}

	fn host_compare(&self, node: NodeId, op: CompareOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
		use std::cmp::Ordering;
		let ordering: Option<Ordering> = match (lhs, rhs) {
			(Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
			(Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
			_ => None,
		};

		use CompareOp::*;
		let result = match (op, ordering) {
			(Eq, _) => lhs == rhs,
			(NotEq, _) => lhs != rhs,
			(Lt, Some(ord)) => ord == Ordering::Less,
			(LtE, Some(ord)) => ord != Ordering::Greater,
			(Gt, Some(ord)) => ord == Ordering::Greater,
			(GtE, Some(ord)) => ord != Ordering::Less,
			(_, None) => {
				return fail(CompileTimeEvalError::InvalidOperands {
					expression: self.tree.render(node),
					reason: format!("cannot order a {} and a {}", lhs.type_name(), rhs.type_name()),
				})
			},
		};
		Ok(Value::Bool(result))
	}

	fn host_unary(&self, node: NodeId, op: UnaryOpKind, value: &Value) -> Result<Value, EvalError> {
		match (op, value) {
			(UnaryOpKind::Not, Value::Bool(v)) => Ok(Value::Bool(!v)),
			(UnaryOpKind::USub, Value::Int(v)) if *v != i64::MIN => Ok(Value::Int(-v)),
			(UnaryOpKind::Invert, Value::Int(v)) => Ok(Value::Int(!v)),
			_ => fail(CompileTimeEvalError::InvalidOperands {
				expression: self.tree.render(node),
				reason: format!("unsupported operand type {}", value.type_name()),
			}),
		}
	}

	/// Short-circuiting host-level `and`/`or`. Signal operands must have been
	/// folded into reduction calls before evaluation.
	fn host_bool_op(&self, op: BoolOpKind, values: &[NodeId]) -> Result<Value, EvalError> {
		let short_circuit = op == BoolOpKind::Or;
		for value in values {
			match self.eval(*value)? {
				Value::Bool(v) if v == short_circuit => return Ok(Value::Bool(v)),
				Value::Bool(_) => (),
				Value::Signal(_) => {
					return fail(CompileTimeEvalError::SignalInHostContext(self.tree.render(*value)));
				},
				other => {
					return fail(CompileTimeEvalError::InvalidOperands {
						expression: self.tree.render(*value),
						reason: format!("expected a boolean, got a {}", other.type_name()),
					})
				},
			}
		}
		Ok(Value::Bool(!short_circuit))
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::syntax::TreeBuilder;
	use rstest::rstest;

	fn eval_host(build: impl FnOnce(&mut TreeBuilder) -> NodeId) -> Result<Value, EvalError> {
		let mut b = TreeBuilder::new();
		let node = build(&mut b);
		let tree = b.finish();
		let mut env = Environment::new();
		env.bind("n", Value::Int(4));
		env.bind("names", Value::List(vec!["a".into(), "b".into()]));
		Interpreter::probe(&tree, &env).eval(node)
	}

	#[rstest]
	#[case(BinOpKind::Add, 7, 2, 9)]
	#[case(BinOpKind::FloorDiv, 7, 2, 3)]
	#[case(BinOpKind::FloorDiv, -7, 2, -4)]
	#[case(BinOpKind::Mod, -7, 2, 1)]
	#[case(BinOpKind::LShift, 1, 4, 16)]
	#[case(BinOpKind::BitXor, 6, 3, 5)]
	fn test_host_arithmetic(#[case] op: BinOpKind, #[case] a: i64, #[case] b: i64, #[case] expected: i64) {
		let value = eval_host(|t| {
			let (a, b) = (t.int(a), t.int(b));
			t.binop(op, a, b)
		});
		assert_eq!(value.unwrap(), Value::Int(expected));
	}

	#[rstest]
	#[case(&[3], vec![0, 1, 2])]
	#[case(&[2, 5], vec![2, 3, 4])]
	#[case(&[5, 0, -2], vec![5, 3, 1])]
	#[case(&[3, 3], vec![])]
	fn test_range(#[case] args: &[i64], #[case] expected: Vec<i64>) {
		let value = eval_host(|t| t.range(args)).unwrap();
		assert_eq!(value, Value::List(expected.into_iter().map(Value::Int).collect()));
	}

	#[test]
	fn test_range_limit() {
		let mut b = TreeBuilder::new();
		let node = b.range(&[100]);
		let tree = b.finish();
		let env = Environment::new();
		let result = Interpreter::probe(&tree, &env).with_sequence_limit(10).eval(node);
		assert!(matches!(
			result,
			Err(EvalError::CompileTime(CompileTimeEvalError::TooManyIterations { limit: 10 }))
		));
	}

	#[test]
	fn test_host_errors() {
		let undefined = eval_host(|t| t.name("missing"));
		assert!(matches!(
			undefined,
			Err(EvalError::CompileTime(CompileTimeEvalError::UndefinedName(..)))
		));

		let div = eval_host(|t| {
			let (a, b) = (t.name("n"), t.int(0));
			t.binop(BinOpKind::Mod, a, b)
		});
		assert!(matches!(div, Err(EvalError::CompileTime(CompileTimeEvalError::DivisionByZero(..)))));

		let index = eval_host(|t| {
			let (names, i) = (t.name("names"), t.int(2));
			t.subscript(names, i)
		});
		assert!(matches!(
			index,
			Err(EvalError::CompileTime(CompileTimeEvalError::IndexOutOfRange { index: 2, len: 2 }))
		));
	}

	#[test]
	fn test_host_logic() {
		let value = eval_host(|t| {
			let n = t.name("n");
			let four = t.int(4);
			let eq = t.eq(n, four);
			let f = t.boolean(false);
			let and = t.and(vec![eq, f]);
			t.not(and)
		});
		assert_eq!(value.unwrap(), Value::Bool(true));

		let len = eval_host(|t| {
			let names = t.name("names");
			t.call_name("len", vec![names])
		});
		assert_eq!(len.unwrap(), Value::Int(2));
	}

	#[test]
	fn test_probe_and_build() -> Result<(), EvalError> {
		let design = Design::new();
		let g = design.new_generator("top")?;
		let s = g.input("s", 4, false)?;
		let mut env = Environment::new();
		env.bind("s", Value::var(s));

		let mut b = TreeBuilder::new();
		let sig = b.name("s");
		let hi = b.int(3);
		let lo = b.int(1);
		let slice = b.slice(sig, hi, lo);
		let two = b.int(2);
		let test = b.eq(slice, two);
		let tree = b.finish();

		let probed = Interpreter::probe(&tree, &env).eval(test)?;
		assert_eq!(probed, Value::Signal(Signal::Deferred));

		let built = Interpreter::build(&tree, &env, &design).eval(test)?;
		let var = built.as_var().unwrap();
		assert_eq!(design.var_name(var), "(s[3:1] == 2)");
		Ok(())
	}

	#[test]
	fn test_signal_in_host_context() -> Result<(), EvalError> {
		let design = Design::new();
		let g = design.new_generator("top")?;
		let a = g.input("a", 1, false)?;
		let mut env = Environment::new();
		env.bind("a", Value::var(a));

		let mut b = TreeBuilder::new();
		let sig = b.name("a");
		let t = b.boolean(true);
		let chain = b.and(vec![t, sig]);
		let names = b.list(vec![]);
		let index = b.name("a");
		let subscript = b.subscript(names, index);
		let tree = b.finish();

		let interp = Interpreter::probe(&tree, &env);
		assert!(matches!(
			interp.eval(chain),
			Err(EvalError::CompileTime(CompileTimeEvalError::SignalInHostContext(..)))
		));
		assert!(matches!(
			interp.eval(subscript),
			Err(EvalError::CompileTime(CompileTimeEvalError::SignalInHostContext(..)))
		));
		Ok(())
	}
}
