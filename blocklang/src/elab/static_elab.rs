use super::{BlockElabCtx, ElabError, SyntaxRestriction};
use crate::eval::{CompileTimeEvalError, EvalError, Value};
use crate::syntax::{substitute, Literal, NodeId, NodeKind};
use log::debug;

/// Loop variable bindings active while a statement was generated (outermost first)
pub(super) type Provenance = Vec<(String, Value)>;

/// Statement remaining after loops were unrolled and constant branches pruned
#[derive(Clone, Debug)]
pub(super) enum ElabStmt {
	/// Any statement other than a loop or a conditional
	Leaf { node: NodeId, provenance: Provenance },

	/// Conditional with a signal-valued predicate
	Conditional {
		/// Original `if` statement
		node: NodeId,

		/// Rewritten predicate
		test: NodeId,

		/// First statement of the else branch (if any)
		else_node: Option<NodeId>,

		then_body: Vec<ElabStmt>,
		else_body: Vec<ElabStmt>,
		provenance: Provenance,
	},
}

impl BlockElabCtx<'_> {
	/// Resolves loops and compile-time conditionals in a statement list
	pub(super) fn elab_body(&mut self, body: &[NodeId]) -> Result<Vec<ElabStmt>, ElabError> {
		let mut output = Vec::new();
		for stmt in body {
			self.elab_statement(*stmt, &mut output)?;
		}
		Ok(output)
	}

	fn elab_statement(&mut self, stmt: NodeId, output: &mut Vec<ElabStmt>) -> Result<(), ElabError> {
		match self.tree.kind(stmt).clone() {
			NodeKind::For {
				target,
				iter,
				body,
				orelse,
			} => self.unroll_loop(stmt, target, iter, &body, &orelse, output),
			NodeKind::If { test, body, orelse } => self.elab_conditional(stmt, test, &body, &orelse, output),
			_ => {
				output.push(ElabStmt::Leaf {
					node: stmt,
					provenance: self.provenance.clone(),
				});
				Ok(())
			},
		}
	}

	/// Evaluates a loop iterable into a list of literals
	fn loop_values(&self, iter: NodeId) -> Result<Vec<Literal>, ElabError> {
		let unresolvable = |reason: String| {
			self.error_at(
				iter,
				CompileTimeEvalError::UnresolvableIterable {
					expression: self.tree.render(iter),
					reason,
				},
			)
		};

		let value = self.interpreter().eval(iter).map_err(|err| match err {
			EvalError::CompileTime(CompileTimeEvalError::TooManyIterations { .. }) => self.error_at(iter, err),
			other => unresolvable(other.to_string()),
		})?;

		let values = match value {
			Value::List(values) => values,
			other => return Err(unresolvable(format!("a {} is not a sequence", other.type_name()))),
		};

		if values.len() > self.config.max_loop_iterations {
			return Err(self.error_at(
				iter,
				CompileTimeEvalError::TooManyIterations {
					limit: self.config.max_loop_iterations,
				},
			));
		}

		values
			.iter()
			.map(|value| {
				value
					.to_literal()
					.ok_or_else(|| self.error_at(iter, CompileTimeEvalError::NonLiteralLoopValue(value.to_string())))
			})
			.collect()
	}

	fn unroll_loop(
		&mut self,
		stmt: NodeId,
		target: NodeId,
		iter: NodeId,
		body: &[NodeId],
		orelse: &[NodeId],
		output: &mut Vec<ElabStmt>,
	) -> Result<(), ElabError> {
		if !orelse.is_empty() {
			return Err(self.error_at(
				stmt,
				SyntaxRestriction::IllegalSyntax("for loops cannot have an else clause".into()),
			));
		}

		let name = match self.tree.kind(target) {
			NodeKind::Name { id } => id.clone(),
			_ => return Err(self.error_at(target, SyntaxRestriction::UnsupportedTarget)),
		};

		// All values are known before anything is emitted
		let values = self.loop_values(iter)?;
		debug!(
			"Unrolling loop over '{}' at line {} ({} iterations)",
			name,
			self.abs_line(stmt),
			values.len()
		);

		for value in values {
			let iteration_body: Vec<NodeId> = body
				.iter()
				.map(|node| substitute(&mut self.tree, *node, &name, &value))
				.collect();

			self.provenance.push((name.clone(), value.into()));
			let result = self.elab_body(&iteration_body);
			self.provenance.pop();
			output.extend(result?);
		}

		Ok(())
	}

	fn elab_conditional(
		&mut self,
		stmt: NodeId,
		test: NodeId,
		body: &[NodeId],
		orelse: &[NodeId],
		output: &mut Vec<ElabStmt>,
	) -> Result<(), ElabError> {
		let test = self.fold_expr(test)?;
		match self.probe(test)? {
			Value::Bool(true) => {
				debug!("Condition at line {} is always true", self.abs_line(stmt));
				output.extend(self.elab_body(body)?);
			},
			Value::Bool(false) => {
				debug!("Condition at line {} is always false", self.abs_line(stmt));
				output.extend(self.elab_body(orelse)?);
			},
			Value::Signal(_) => {
				debug!("Lowering runtime conditional at line {}", self.abs_line(stmt));
				let then_body = self.elab_body(body)?;
				let else_body = self.elab_body(orelse)?;
				output.push(ElabStmt::Conditional {
					node: stmt,
					test,
					else_node: orelse.first().copied(),
					then_body,
					else_body,
					provenance: self.provenance.clone(),
				});
			},
			other => {
				return Err(self.error_at(
					test,
					CompileTimeEvalError::NonBooleanPredicate {
						expression: self.tree.render(test),
						type_name: other.type_name().into(),
					},
				));
			},
		}
		Ok(())
	}
}
