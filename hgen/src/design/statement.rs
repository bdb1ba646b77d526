use std::fmt;

use super::{FunctionId, StmtId, VarId};

/// Source location attached to statements and variables for debugging
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceRef {
	pub file: String,
	pub line: u32,
}

impl SourceRef {
	pub fn new(file: &str, line: u32) -> Self {
		Self {
			file: file.to_string(),
			line,
		}
	}
}

impl fmt::Display for SourceRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.file, self.line)
	}
}

/// Named value visible when the statement was generated
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeVariable {
	pub name: String,
	pub value: String,

	/// True if the value names a hardware variable rather than a plain constant
	pub is_var: bool,
}

/// Selects a branch of a conditional statement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Branch {
	Then,
	Else,
}

/// Ordered list of statements forming a branch body
#[derive(Clone, Debug, Default)]
pub struct StatementBlock {
	pub stmts: Vec<StmtId>,
	pub fn_ln: Vec<SourceRef>,
}

/// Semantic content of a statement
#[derive(Clone, Debug)]
pub enum StatementKind {
	Assign {
		lhs: VarId,
		rhs: VarId,
	},
	If {
		predicate: VarId,
		then_body: StatementBlock,
		else_body: StatementBlock,
	},
	Assert {
		value: VarId,
	},
	Return {
		function: FunctionId,
		value: VarId,
	},
}

/// Statement owned by the design
#[derive(Clone, Debug)]
pub struct Statement {
	/// Self-reference
	pub(super) id: StmtId,

	/// Conditional statement owning this one (if any)
	pub(super) parent: Option<StmtId>,

	pub kind: StatementKind,

	/// Source locations this statement was generated from
	pub fn_ln: Vec<SourceRef>,

	/// Named values attached for debugging
	pub scope_vars: Vec<ScopeVariable>,
}

impl Statement {
	pub(super) fn new(kind: StatementKind) -> Self {
		Self {
			id: StmtId { id: 0 },
			parent: None,
			kind,
			fn_ln: vec![],
			scope_vars: vec![],
		}
	}

	pub fn id(&self) -> StmtId {
		self.id
	}

	pub fn parent(&self) -> Option<StmtId> {
		self.parent
	}

	pub fn is_conditional(&self) -> bool {
		matches!(self.kind, StatementKind::If { .. })
	}

	/// Returns the requested branch body of a conditional statement
	pub fn body(&self, branch: Branch) -> Option<&StatementBlock> {
		match &self.kind {
			StatementKind::If {
				then_body, else_body, ..
			} => Some(match branch {
				Branch::Then => then_body,
				Branch::Else => else_body,
			}),
			_ => None,
		}
	}

	pub(super) fn body_mut(&mut self, branch: Branch) -> Option<&mut StatementBlock> {
		match &mut self.kind {
			StatementKind::If {
				then_body, else_body, ..
			} => Some(match branch {
				Branch::Then => then_body,
				Branch::Else => else_body,
			}),
			_ => None,
		}
	}

	/// Looks up a named debug value
	pub fn scope_variable(&self, name: &str) -> Option<&ScopeVariable> {
		self.scope_vars.iter().find(|v| v.name == name)
	}
}
