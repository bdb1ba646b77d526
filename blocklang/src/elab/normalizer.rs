use super::static_elab::{ElabStmt, Provenance};
use super::{BlockElabCtx, ElabError, SyntaxRestriction};
use crate::syntax::{NodeId, NodeKind};

/// Value checked by an assertion
#[derive(Clone, Debug)]
pub(super) enum AssertValue {
	Expr(NodeId),

	/// `raise Exception(...)`
	AlwaysFail,
}

/// Else branch of a lowered conditional
#[derive(Clone, Debug)]
pub(super) struct ElseCall {
	pub body: Vec<ScopeCall>,

	/// Line of the first else statement
	pub line: Option<u32>,
}

/// Scope operation generated for a block statement.
/// Lines are absolute source lines. Loop variables are only recorded in debug mode.
#[derive(Clone, Debug)]
pub(super) enum ScopeCall {
	Assign {
		target: NodeId,
		value: NodeId,
		line: u32,
		loop_vars: Provenance,
	},
	Assert {
		value: AssertValue,
		line: u32,
		loop_vars: Provenance,
	},
	Return {
		value: NodeId,
		line: u32,
	},
	If {
		test: NodeId,
		then_body: Vec<ScopeCall>,
		line: u32,
		loop_vars: Provenance,
		else_: ElseCall,
	},

	/// Appends the statement produced by the inner call to the scope
	AddStmt(Box<ScopeCall>),
}

impl BlockElabCtx<'_> {
	/// Turns elaborated statements into top-level scope calls
	pub(super) fn normalize_block(&mut self, stmts: Vec<ElabStmt>) -> Result<Vec<ScopeCall>, ElabError> {
		Ok(self
			.normalize_body(stmts)?
			.into_iter()
			.map(|call| ScopeCall::AddStmt(Box::new(call)))
			.collect())
	}

	fn normalize_body(&mut self, stmts: Vec<ElabStmt>) -> Result<Vec<ScopeCall>, ElabError> {
		let mut calls = Vec::with_capacity(stmts.len());
		for stmt in stmts {
			if let Some(call) = self.normalize_stmt(stmt)? {
				calls.push(call);
			}
		}
		Ok(calls)
	}

	fn loop_vars(&self, provenance: Provenance) -> Provenance {
		if self.config.debug {
			provenance
		}
		else {
			vec![]
		}
	}

	fn normalize_stmt(&mut self, stmt: ElabStmt) -> Result<Option<ScopeCall>, ElabError> {
		match stmt {
			ElabStmt::Leaf { node, provenance } => self.normalize_leaf(node, provenance),
			ElabStmt::Conditional {
				node,
				test,
				else_node,
				then_body,
				else_body,
				provenance,
			} => {
				let then_body = self.normalize_body(then_body)?;
				let else_body = self.normalize_body(else_body)?;
				Ok(Some(ScopeCall::If {
					test,
					then_body,
					line: self.abs_line(node),
					loop_vars: self.loop_vars(provenance),
					else_: ElseCall {
						body: else_body,
						line: else_node.map(|node| self.abs_line(node)),
					},
				}))
			},
		}
	}

	fn is_destructuring(&self, target: NodeId) -> bool {
		matches!(self.tree.kind(target), NodeKind::Tuple { .. } | NodeKind::List { .. })
	}

	fn is_exception(&self, exc: NodeId) -> bool {
		match self.tree.kind(exc) {
			NodeKind::Name { id } => id == "Exception",
			NodeKind::Call { func, .. } => {
				matches!(self.tree.kind(*func), NodeKind::Name { id } if id == "Exception")
			},
			_ => false,
		}
	}

	/// Returns the argument of an `assert_(...)` call
	fn assert_argument(&self, value: NodeId) -> Option<NodeId> {
		let (func, args) = match self.tree.kind(value) {
			NodeKind::Call { func, args } => (*func, args),
			_ => return None,
		};

		let is_assert = match self.tree.kind(func) {
			NodeKind::Name { id } => id == "assert_",
			NodeKind::Attribute { attr, .. } => attr == "assert_",
			_ => false,
		};

		match args.as_slice() {
			[arg] if is_assert => Some(*arg),
			_ => None,
		}
	}

	fn normalize_leaf(&mut self, node: NodeId, provenance: Provenance) -> Result<Option<ScopeCall>, ElabError> {
		let line = self.abs_line(node);
		let unsupported = |ctx: &Self| ctx.error_at(node, SyntaxRestriction::UnsupportedSyntax(ctx.tree.render(node)));

		let call = match self.tree.kind(node).clone() {
			NodeKind::Assign { targets, value } => {
				let target = match targets.as_slice() {
					[target] if !self.is_destructuring(*target) => *target,
					_ => return Err(self.error_at(node, SyntaxRestriction::DestructuringAssignment)),
				};
				ScopeCall::Assign {
					target,
					value: self.fold_expr(value)?,
					line,
					loop_vars: self.loop_vars(provenance),
				}
			},

			NodeKind::AugAssign { target, op, value } => {
				if self.is_destructuring(target) {
					return Err(self.error_at(node, SyntaxRestriction::DestructuringAssignment));
				}
				let loc = self.tree.loc(node);
				let combined = self.tree.add(
					NodeKind::BinOp {
						op,
						left: target,
						right: value,
					},
					loc,
				);
				ScopeCall::Assign {
					target,
					value: self.fold_expr(combined)?,
					line,
					loop_vars: self.loop_vars(provenance),
				}
			},

			NodeKind::ExprStmt { value } => match self.assert_argument(value) {
				Some(arg) => ScopeCall::Assert {
					value: AssertValue::Expr(self.fold_expr(arg)?),
					line,
					loop_vars: self.loop_vars(provenance),
				},
				None => return Err(unsupported(self)),
			},

			NodeKind::Raise { exc: Some(exc) } if self.is_exception(exc) => ScopeCall::Assert {
				value: AssertValue::AlwaysFail,
				line,
				loop_vars: self.loop_vars(provenance),
			},

			NodeKind::Raise { .. } => {
				return Err(self.error_at(node, SyntaxRestriction::UnsupportedRaise(self.tree.render(node))));
			},

			NodeKind::Return { .. } if !self.is_function => {
				return Err(self.error_at(node, SyntaxRestriction::ReturnOutsideFunction));
			},

			NodeKind::Return { value: Some(value) } => ScopeCall::Return {
				value: self.fold_expr(value)?,
				line,
			},

			NodeKind::Pass => return Ok(None),

			_ => return Err(unsupported(self)),
		};

		Ok(Some(call))
	}
}

#[cfg(test)]
mod test {
	use crate::elab::test::{block_env, dump, elaborate_with};
	use crate::elab::{ElabConfig, ElabErrorKind, SyntaxRestriction};
	use crate::syntax::{BinOpKind, NodeKind, TreeBuilder};
	use hgen::SourceRef;

	#[test]
	fn test_aug_assign() {
		let mut b = TreeBuilder::new();
		b.at(2);
		let acc = b.name("acc");
		let one = b.int(1);
		let stmt = b.aug_assign(acc, BinOpKind::Add, one);
		let f = b.function("comb", &[], vec![], vec![stmt]);
		let tree = b.finish();

		let (design, generator, env) = block_env();
		let result = elaborate_with(ElabConfig::default(), &generator, &tree, f, &env).unwrap();
		assert_eq!(dump(&design, &result.statements), "acc = (acc + 1)\n");
	}

	#[test]
	fn test_assert_and_raise() {
		let mut b = TreeBuilder::new();
		b.at(2);
		let a = b.name("a");
		let check = b.assert_(a);
		b.at(3);
		let fail = b.raise_exception("unreachable");
		b.at(4);
		let pass = b.pass();
		let f = b.function("comb", &[], vec![], vec![check, fail, pass]);
		let tree = b.finish();

		let (design, generator, env) = block_env();
		let result = elaborate_with(ElabConfig::default(), &generator, &tree, f, &env).unwrap();
		assert_eq!(dump(&design, &result.statements), "assert a\nassert 0\n");
	}

	#[test]
	fn test_destructuring_assignment() {
		let mut b = TreeBuilder::new();
		b.at(5);
		let (a, o) = (b.name("out"), b.name("acc"));
		let target = b.tuple(vec![a, o]);
		let (one, two) = (b.int(1), b.int(2));
		let value = b.tuple(vec![one, two]);
		let stmt = b.assign(target, value);
		let f = b.function("comb", &[], vec![], vec![stmt]);
		let tree = b.finish();

		let (_design, generator, env) = block_env();
		let err = elaborate_with(ElabConfig::default(), &generator, &tree, f, &env).unwrap_err();
		assert!(matches!(
			err.kind,
			ElabErrorKind::SyntaxRestriction(SyntaxRestriction::DestructuringAssignment)
		));
		assert_eq!(err.location, Some(SourceRef::new("top.py", 14)));
	}

	#[test]
	fn test_unsupported_statements() {
		let (_design, generator, env) = block_env();

		// raise of anything else than Exception
		let mut b = TreeBuilder::new();
		b.at(2);
		let msg = b.string("bad");
		let exc = b.call_name("ValueError", vec![msg]);
		let stmt = b.add(NodeKind::Raise { exc: Some(exc) });
		let f = b.function("comb", &[], vec![], vec![stmt]);
		let tree = b.finish();
		let err = elaborate_with(ElabConfig::default(), &generator, &tree, f, &env).unwrap_err();
		assert!(matches!(
			err.kind,
			ElabErrorKind::SyntaxRestriction(SyntaxRestriction::UnsupportedRaise(..))
		));

		// return in a statement block
		let mut b = TreeBuilder::new();
		b.at(2);
		let a = b.name("a");
		let stmt = b.return_(a);
		let f = b.function("comb", &[], vec![], vec![stmt]);
		let tree = b.finish();
		let err = elaborate_with(ElabConfig::default(), &generator, &tree, f, &env).unwrap_err();
		assert!(matches!(
			err.kind,
			ElabErrorKind::SyntaxRestriction(SyntaxRestriction::ReturnOutsideFunction)
		));

		// bare expression statement
		let mut b = TreeBuilder::new();
		b.at(2);
		let a = b.name("a");
		let stmt = b.expr_stmt(a);
		let f = b.function("comb", &[], vec![], vec![stmt]);
		let tree = b.finish();
		let err = elaborate_with(ElabConfig::default(), &generator, &tree, f, &env).unwrap_err();
		assert!(matches!(
			err.kind,
			ElabErrorKind::SyntaxRestriction(SyntaxRestriction::UnsupportedSyntax(ref text)) if text == "a"
		));
	}
}
