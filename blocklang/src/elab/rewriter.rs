use super::{BlockElabCtx, ElabError, ElabErrorKind};
use crate::syntax::{BoolOpKind, CompareOp, NodeId, NodeKind, SourceLoc, UnaryOpKind};
use log::debug;

impl BlockElabCtx<'_> {
	/// Rewrites boolean operations on signals into hardware operator calls.
	///
	/// `a and b and c` becomes `a.and_(b).and_(c)`, `not a` becomes `a.r_not()`
	/// and `a == b` becomes `a.eq(b)` whenever the left operand is a signal.
	/// Expressions involving only compile-time values are left untouched.
	/// Unchanged subtrees keep their node IDs.
	pub(super) fn fold_expr(&mut self, node: NodeId) -> Result<NodeId, ElabError> {
		let loc = self.tree.loc(node);
		match self.tree.kind(node).clone() {
			NodeKind::BoolOp { op, values } => {
				let values = values
					.iter()
					.map(|value| self.fold_expr(*value))
					.collect::<Result<Vec<_>, _>>()?;

				let mut signal_count = 0;
				for value in &values {
					if self.probe(*value)?.is_signal() {
						signal_count += 1;
					}
				}

				if signal_count == 0 {
					return Ok(self.rebuild(node, NodeKind::BoolOp { op, values }));
				}

				if signal_count != values.len() {
					return Err(self.error_at(
						node,
						ElabErrorKind::MixedOperand {
							expression: self.tree.render(node),
						},
					));
				}

				let method = match op {
					BoolOpKind::And => "and_",
					BoolOpKind::Or => "or_",
				};

				let (first, rest) = match values.split_first() {
					Some(split) => split,
					None => return Ok(node),
				};

				let folded = rest
					.iter()
					.fold(*first, |acc, value| self.method_call(acc, method, vec![*value], loc));
				debug!(
					"Folded '{}' into '{}' at line {}",
					self.tree.render(node),
					self.tree.render(folded),
					self.abs_line(node)
				);
				Ok(folded)
			},

			NodeKind::UnaryOp {
				op: UnaryOpKind::Not,
				operand,
			} => {
				let operand = self.fold_expr(operand)?;
				if self.probe(operand)?.is_signal() {
					Ok(self.method_call(operand, "r_not", vec![], loc))
				}
				else {
					Ok(self.rebuild(
						node,
						NodeKind::UnaryOp {
							op: UnaryOpKind::Not,
							operand,
						},
					))
				}
			},

			NodeKind::Compare {
				op: CompareOp::Eq,
				left,
				right,
			} => {
				let left = self.fold_expr(left)?;
				let right = self.fold_expr(right)?;
				if self.probe(left)?.is_signal() {
					Ok(self.method_call(left, "eq", vec![right], loc))
				}
				else {
					Ok(self.rebuild(
						node,
						NodeKind::Compare {
							op: CompareOp::Eq,
							left,
							right,
						},
					))
				}
			},

			kind if kind.is_statement() => Ok(node),

			kind => {
				let mut failure = None;
				let mapped = kind.map_children(|child| match self.fold_expr(child) {
					Ok(id) => id,
					Err(err) => {
						failure.get_or_insert(err);
						child
					},
				});

				match failure {
					Some(err) => Err(err),
					None => Ok(self.rebuild(node, mapped)),
				}
			},
		}
	}

	/// Adds a new node unless the kind matches the existing one
	fn rebuild(&mut self, node: NodeId, kind: NodeKind) -> NodeId {
		if *self.tree.kind(node) == kind {
			return node;
		}
		let loc = self.tree.loc(node);
		self.tree.add(kind, loc)
	}

	/// Builds `value.method(args...)`
	fn method_call(&mut self, value: NodeId, method: &str, args: Vec<NodeId>, loc: SourceLoc) -> NodeId {
		let func = self.tree.add(
			NodeKind::Attribute {
				value,
				attr: method.into(),
			},
			loc,
		);
		self.tree.add(NodeKind::Call { func, args }, loc)
	}
}

#[cfg(test)]
mod test {
	use crate::elab::test::{block_env, dump, elaborate_with};
	use crate::elab::{ElabConfig, ElabErrorKind};
	use crate::syntax::TreeBuilder;
	use hgen::SourceRef;

	#[test]
	fn test_and_chain_folding() {
		let mut b = TreeBuilder::new();
		b.at(2);
		let (x, y, z) = (b.name("a"), b.name("b"), b.name("c"));
		let test = b.and(vec![x, y, z]);
		let out = b.name("out");
		let one = b.int(1);
		let assign = b.assign(out, one);
		let stmt = b.if_(test, vec![assign], vec![]);
		let f = b.function("comb", &[], vec![], vec![stmt]);
		let tree = b.finish();

		let (design, generator, env) = block_env();
		let result = elaborate_with(ElabConfig::default(), &generator, &tree, f, &env).unwrap();
		assert_eq!(dump(&design, &result.statements), "if ((a && b) && c)\n\tout = 1\n");
	}

	#[test]
	fn test_or_and_not_folding() {
		let mut b = TreeBuilder::new();
		b.at(2);
		let a = b.name("a");
		let not_a = b.not(a);
		let c = b.name("c");
		let test = b.or(vec![not_a, c]);
		let out = b.name("out");
		let zero = b.int(0);
		let assign = b.assign(out, zero);
		let stmt = b.if_(test, vec![assign], vec![]);
		let f = b.function("comb", &[], vec![], vec![stmt]);
		let tree = b.finish();

		let (design, generator, env) = block_env();
		let result = elaborate_with(ElabConfig::default(), &generator, &tree, f, &env).unwrap();
		assert_eq!(dump(&design, &result.statements), "if (!a || c)\n\tout = 0\n");
	}

	#[test]
	fn test_folding_in_assignment_value() {
		let mut b = TreeBuilder::new();
		b.at(2);
		let out = b.name("out");
		let a = b.name("a");
		let y = b.name("y");
		let value = b.and(vec![a, y]);
		let assign = b.assign(out, value);
		let f = b.function("comb", &[], vec![], vec![assign]);
		let tree = b.finish();

		let (design, generator, env) = block_env();
		let result = elaborate_with(ElabConfig::default(), &generator, &tree, f, &env).unwrap();
		assert_eq!(dump(&design, &result.statements), "out = (a && y)\n");
	}

	#[test]
	fn test_host_logic_is_not_folded() {
		let mut b = TreeBuilder::new();
		b.at(2);
		let flag = b.name("flag");
		let width = b.name("WIDTH");
		let four = b.int(4);
		let width_ok = b.eq(width, four);
		let test = b.and(vec![flag, width_ok]);
		let out = b.name("out");
		let one = b.int(1);
		let assign = b.assign(out, one);
		let stmt = b.if_(test, vec![assign], vec![]);
		let f = b.function("comb", &[], vec![], vec![stmt]);
		let tree = b.finish();

		let (design, generator, env) = block_env();
		let result = elaborate_with(ElabConfig::default(), &generator, &tree, f, &env).unwrap();
		assert_eq!(dump(&design, &result.statements), "out = 1\n");
	}

	#[test]
	fn test_mixed_operands() {
		let mut b = TreeBuilder::new();
		b.at(3);
		let a = b.name("a");
		let flag = b.name("flag");
		let test = b.and(vec![a, flag]);
		let out = b.name("out");
		let one = b.int(1);
		let assign = b.assign(out, one);
		let stmt = b.if_(test, vec![assign], vec![]);
		let f = b.function("comb", &[], vec![], vec![stmt]);
		let tree = b.finish();

		let (_design, generator, env) = block_env();
		let err = elaborate_with(ElabConfig::default(), &generator, &tree, f, &env).unwrap_err();
		assert!(matches!(err.kind, ElabErrorKind::MixedOperand { ref expression } if expression == "a and flag"));
		assert_eq!(err.location, Some(SourceRef::new("top.py", 12)));
	}
}
