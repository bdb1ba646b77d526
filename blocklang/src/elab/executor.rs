use super::normalizer::{AssertValue, ScopeCall};
use super::{BlockElabCtx, ElabError, StatementScope};
use crate::eval::{Interpreter, Value};
use crate::syntax::NodeId;
use hgen::StmtId;

impl BlockElabCtx<'_> {
	/// Runs scope calls against a scope, constructing the statements
	pub(super) fn execute<S: StatementScope>(&self, scope: &mut S, calls: &[ScopeCall]) -> Result<(), ElabError> {
		for call in calls {
			self.execute_call(scope, call)?;
		}
		Ok(())
	}

	/// Evaluates an expression, constructing hardware operations as needed
	fn build_value<S: StatementScope>(&self, scope: &mut S, node: NodeId, line: u32) -> Result<Value, ElabError> {
		let design = scope.scope().design().clone();
		Interpreter::build(&self.tree, &self.env, &design)
			.with_sequence_limit(self.config.max_loop_iterations)
			.eval(node)
			.map_err(|err| ElabError::from(err).at(self.location(line)))
	}

	fn execute_call<S: StatementScope>(&self, scope: &mut S, call: &ScopeCall) -> Result<StmtId, ElabError> {
		match call {
			ScopeCall::AddStmt(inner) => {
				let stmt = self.execute_call(scope, inner)?;
				scope.scope().add_stmt(stmt);
				Ok(stmt)
			},

			ScopeCall::Assign {
				target,
				value,
				line,
				loop_vars,
			} => {
				let target = self.build_value(scope, *target, *line)?;
				let value = self.build_value(scope, *value, *line)?;
				scope
					.scope()
					.assign(&target, &value, Some(*line), loop_vars)
					.map_err(|err| err.at(self.location(*line)))
			},

			ScopeCall::Assert { value, line, loop_vars } => {
				let value = match value {
					AssertValue::Expr(node) => self.build_value(scope, *node, *line)?,
					AssertValue::AlwaysFail => Value::Int(0),
				};
				scope
					.scope()
					.assert_(&value, Some(*line), loop_vars)
					.map_err(|err| err.at(self.location(*line)))
			},

			ScopeCall::Return { value, line } => {
				let value = self.build_value(scope, *value, *line)?;
				scope
					.return_(&value, Some(*line))
					.map_err(|err| err.at(self.location(*line)))
			},

			ScopeCall::If {
				test,
				then_body,
				line,
				loop_vars,
				else_,
			} => {
				let test = self.build_value(scope, *test, *line)?;
				let then_stmts = then_body
					.iter()
					.map(|call| self.execute_call(scope, call))
					.collect::<Result<Vec<_>, _>>()?;
				let else_stmts = else_
					.body
					.iter()
					.map(|call| self.execute_call(scope, call))
					.collect::<Result<Vec<_>, _>>()?;

				let handle = scope
					.scope()
					.if_(&test, then_stmts, Some(*line), loop_vars)
					.map_err(|err| err.at(self.location(*line)))?;
				let handle = handle
					.else_(else_stmts, else_.line)
					.map_err(|err| err.at(self.location(else_.line.unwrap_or(*line))))?;
				Ok(handle.into())
			},
		}
	}
}
