use super::node::{BinOpKind, BoolOpKind, CompareOp, NodeId, NodeKind, SourceLoc, UnaryOpKind};
use super::tree::SyntaxTree;

/// Convenience interface for building syntax trees by hand.
///
/// Every node gets the line selected with `at()`. Children must be built
/// before their parents.
pub struct TreeBuilder {
	tree: SyntaxTree,
	line: u32,
}

impl Default for TreeBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl TreeBuilder {
	pub fn new() -> Self {
		Self {
			tree: SyntaxTree::new(),
			line: 1,
		}
	}

	/// Sets the line of subsequently added nodes
	pub fn at(&mut self, line: u32) -> &mut Self {
		self.line = line;
		self
	}

	pub fn finish(self) -> SyntaxTree {
		self.tree
	}

	pub fn add(&mut self, kind: NodeKind) -> NodeId {
		self.tree.add(kind, SourceLoc::new(self.line, 0))
	}

	pub fn name(&mut self, id: &str) -> NodeId {
		self.add(NodeKind::Name { id: id.into() })
	}

	pub fn int(&mut self, value: i64) -> NodeId {
		self.add(NodeKind::Int { value })
	}

	pub fn string(&mut self, value: &str) -> NodeId {
		self.add(NodeKind::Str { value: value.into() })
	}

	pub fn boolean(&mut self, value: bool) -> NodeId {
		self.add(NodeKind::Bool { value })
	}

	pub fn attr(&mut self, value: NodeId, attr: &str) -> NodeId {
		self.add(NodeKind::Attribute {
			value,
			attr: attr.into(),
		})
	}

	pub fn subscript(&mut self, value: NodeId, index: NodeId) -> NodeId {
		self.add(NodeKind::Subscript { value, index })
	}

	/// Bit range subscript `value[hi, lo]`
	pub fn slice(&mut self, value: NodeId, hi: NodeId, lo: NodeId) -> NodeId {
		let index = self.tuple(vec![hi, lo]);
		self.subscript(value, index)
	}

	pub fn call(&mut self, func: NodeId, args: Vec<NodeId>) -> NodeId {
		self.add(NodeKind::Call { func, args })
	}

	/// Call of a plain function name, e.g. `range(3)`
	pub fn call_name(&mut self, func: &str, args: Vec<NodeId>) -> NodeId {
		let func = self.name(func);
		self.call(func, args)
	}

	/// Method call, e.g. `a.and_(b)`
	pub fn method(&mut self, value: NodeId, method: &str, args: Vec<NodeId>) -> NodeId {
		let func = self.attr(value, method);
		self.call(func, args)
	}

	pub fn binop(&mut self, op: BinOpKind, left: NodeId, right: NodeId) -> NodeId {
		self.add(NodeKind::BinOp { op, left, right })
	}

	pub fn compare(&mut self, op: CompareOp, left: NodeId, right: NodeId) -> NodeId {
		self.add(NodeKind::Compare { op, left, right })
	}

	pub fn eq(&mut self, left: NodeId, right: NodeId) -> NodeId {
		self.compare(CompareOp::Eq, left, right)
	}

	pub fn and(&mut self, values: Vec<NodeId>) -> NodeId {
		self.add(NodeKind::BoolOp {
			op: BoolOpKind::And,
			values,
		})
	}

	pub fn or(&mut self, values: Vec<NodeId>) -> NodeId {
		self.add(NodeKind::BoolOp {
			op: BoolOpKind::Or,
			values,
		})
	}

	pub fn not(&mut self, operand: NodeId) -> NodeId {
		self.unary(UnaryOpKind::Not, operand)
	}

	pub fn unary(&mut self, op: UnaryOpKind, operand: NodeId) -> NodeId {
		self.add(NodeKind::UnaryOp { op, operand })
	}

	pub fn tuple(&mut self, elts: Vec<NodeId>) -> NodeId {
		self.add(NodeKind::Tuple { elts })
	}

	pub fn list(&mut self, elts: Vec<NodeId>) -> NodeId {
		self.add(NodeKind::List { elts })
	}

	/// `range(...)` call with integer arguments
	pub fn range(&mut self, args: &[i64]) -> NodeId {
		let args = args.iter().map(|v| self.int(*v)).collect();
		self.call_name("range", args)
	}

	pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
		self.add(NodeKind::Assign {
			targets: vec![target],
			value,
		})
	}

	pub fn aug_assign(&mut self, target: NodeId, op: BinOpKind, value: NodeId) -> NodeId {
		self.add(NodeKind::AugAssign { target, op, value })
	}

	pub fn if_(&mut self, test: NodeId, body: Vec<NodeId>, orelse: Vec<NodeId>) -> NodeId {
		self.add(NodeKind::If { test, body, orelse })
	}

	pub fn for_(&mut self, target: &str, iter: NodeId, body: Vec<NodeId>) -> NodeId {
		let target = self.name(target);
		self.add(NodeKind::For {
			target,
			iter,
			body,
			orelse: vec![],
		})
	}

	pub fn expr_stmt(&mut self, value: NodeId) -> NodeId {
		self.add(NodeKind::ExprStmt { value })
	}

	/// `assert_(value)` statement
	pub fn assert_(&mut self, value: NodeId) -> NodeId {
		let call = self.call_name("assert_", vec![value]);
		self.expr_stmt(call)
	}

	/// `raise Exception(message)` statement
	pub fn raise_exception(&mut self, message: &str) -> NodeId {
		let message = self.string(message);
		let exc = self.call_name("Exception", vec![message]);
		self.add(NodeKind::Raise { exc: Some(exc) })
	}

	pub fn return_(&mut self, value: NodeId) -> NodeId {
		self.add(NodeKind::Return { value: Some(value) })
	}

	pub fn pass(&mut self) -> NodeId {
		self.add(NodeKind::Pass)
	}

	/// `always_ff((edge, signal), ...)` decoration; signals are looked up on `self`
	pub fn always_ff(&mut self, entries: &[(&str, &str)]) -> NodeId {
		let entries = entries
			.iter()
			.map(|(edge, signal)| {
				let edge = self.name(edge);
				let owner = self.name("self");
				let signal = self.attr(owner, signal);
				self.tuple(vec![edge, signal])
			})
			.collect();
		self.call_name("always_ff", entries)
	}

	/// Function definition. The definition is placed at line 1.
	pub fn function(&mut self, name: &str, params: &[&str], decorators: Vec<NodeId>, body: Vec<NodeId>) -> NodeId {
		self.at(1);
		self.add(NodeKind::FunctionDef {
			name: name.into(),
			params: params.iter().map(|p| p.to_string()).collect(),
			decorators,
			body,
		})
	}
}
