use serde::{Deserialize, Serialize};
use std::fmt;

/// References a node in a syntax tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Position of a node, relative to the first line of the function definition (which is line 1)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLoc {
	pub line: u32,
	#[serde(default)]
	pub column: u32,
}

impl SourceLoc {
	pub fn new(line: u32, column: u32) -> Self {
		Self { line, column }
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOpKind {
	Add,
	Sub,
	Mult,
	FloorDiv,
	Mod,
	LShift,
	RShift,
	BitAnd,
	BitOr,
	BitXor,
}

impl BinOpKind {
	pub fn symbol(&self) -> &'static str {
		use BinOpKind::*;
		match self {
			Add => "+",
			Sub => "-",
			Mult => "*",
			FloorDiv => "//",
			Mod => "%",
			LShift => "<<",
			RShift => ">>",
			BitAnd => "&",
			BitOr => "|",
			BitXor => "^",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOpKind {
	Not,
	USub,
	Invert,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOpKind {
	And,
	Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
	Eq,
	NotEq,
	Lt,
	LtE,
	Gt,
	GtE,
}

impl CompareOp {
	pub fn symbol(&self) -> &'static str {
		use CompareOp::*;
		match self {
			Eq => "==",
			NotEq => "!=",
			Lt => "<",
			LtE => "<=",
			Gt => ">",
			GtE => ">=",
		}
	}
}

/// Statement and expression forms of the block sub-language
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NodeKind {
	FunctionDef {
		name: String,
		params: Vec<String>,
		#[serde(default)]
		decorators: Vec<NodeId>,
		body: Vec<NodeId>,
	},
	Assign {
		targets: Vec<NodeId>,
		value: NodeId,
	},
	AugAssign {
		target: NodeId,
		op: BinOpKind,
		value: NodeId,
	},
	If {
		test: NodeId,
		body: Vec<NodeId>,
		#[serde(default)]
		orelse: Vec<NodeId>,
	},
	For {
		target: NodeId,
		iter: NodeId,
		body: Vec<NodeId>,
		#[serde(default)]
		orelse: Vec<NodeId>,
	},
	ExprStmt {
		value: NodeId,
	},
	Raise {
		exc: Option<NodeId>,
	},
	Return {
		value: Option<NodeId>,
	},
	Pass,
	Name {
		id: String,
	},
	Int {
		value: i64,
	},
	Str {
		value: String,
	},
	Bool {
		value: bool,
	},
	Attribute {
		value: NodeId,
		attr: String,
	},
	Subscript {
		value: NodeId,
		index: NodeId,
	},
	Call {
		func: NodeId,
		args: Vec<NodeId>,
	},
	BinOp {
		op: BinOpKind,
		left: NodeId,
		right: NodeId,
	},
	UnaryOp {
		op: UnaryOpKind,
		operand: NodeId,
	},
	BoolOp {
		op: BoolOpKind,
		values: Vec<NodeId>,
	},
	Compare {
		op: CompareOp,
		left: NodeId,
		right: NodeId,
	},
	Tuple {
		elts: Vec<NodeId>,
	},
	List {
		elts: Vec<NodeId>,
	},
}

impl NodeKind {
	/// Returns all directly referenced nodes in source order
	pub fn children(&self) -> Vec<NodeId> {
		use NodeKind::*;
		match self {
			FunctionDef { decorators, body, .. } => decorators.iter().chain(body.iter()).copied().collect(),
			Assign { targets, value } => targets.iter().copied().chain(std::iter::once(*value)).collect(),
			AugAssign { target, value, .. } => vec![*target, *value],
			If { test, body, orelse } => std::iter::once(*test)
				.chain(body.iter().copied())
				.chain(orelse.iter().copied())
				.collect(),
			For {
				target,
				iter,
				body,
				orelse,
			} => [*target, *iter]
				.into_iter()
				.chain(body.iter().copied())
				.chain(orelse.iter().copied())
				.collect(),
			ExprStmt { value } => vec![*value],
			Raise { exc } => exc.iter().copied().collect(),
			Return { value } => value.iter().copied().collect(),
			Attribute { value, .. } => vec![*value],
			Subscript { value, index } => vec![*value, *index],
			Call { func, args } => std::iter::once(*func).chain(args.iter().copied()).collect(),
			BinOp { left, right, .. } | Compare { left, right, .. } => vec![*left, *right],
			UnaryOp { operand, .. } => vec![*operand],
			BoolOp { values, .. } => values.clone(),
			Tuple { elts } | List { elts } => elts.clone(),
			Pass | Name { .. } | Int { .. } | Str { .. } | Bool { .. } => vec![],
		}
	}

	/// Rebuilds the node with every child reference passed through `f`
	pub fn map_children<F>(self, mut f: F) -> NodeKind
	where
		F: FnMut(NodeId) -> NodeId,
	{
		let map_all = |ids: Vec<NodeId>, f: &mut F| ids.into_iter().map(|id| f(id)).collect::<Vec<_>>();

		use NodeKind::*;
		match self {
			FunctionDef {
				name,
				params,
				decorators,
				body,
			} => FunctionDef {
				name,
				params,
				decorators: map_all(decorators, &mut f),
				body: map_all(body, &mut f),
			},
			Assign { targets, value } => Assign {
				targets: map_all(targets, &mut f),
				value: f(value),
			},
			AugAssign { target, op, value } => AugAssign {
				target: f(target),
				op,
				value: f(value),
			},
			If { test, body, orelse } => If {
				test: f(test),
				body: map_all(body, &mut f),
				orelse: map_all(orelse, &mut f),
			},
			For {
				target,
				iter,
				body,
				orelse,
			} => For {
				target: f(target),
				iter: f(iter),
				body: map_all(body, &mut f),
				orelse: map_all(orelse, &mut f),
			},
			ExprStmt { value } => ExprStmt { value: f(value) },
			Raise { exc } => Raise { exc: exc.map(&mut f) },
			Return { value } => Return { value: value.map(&mut f) },
			Attribute { value, attr } => Attribute { value: f(value), attr },
			Subscript { value, index } => Subscript {
				value: f(value),
				index: f(index),
			},
			Call { func, args } => Call {
				func: f(func),
				args: map_all(args, &mut f),
			},
			BinOp { op, left, right } => BinOp {
				op,
				left: f(left),
				right: f(right),
			},
			Compare { op, left, right } => Compare {
				op,
				left: f(left),
				right: f(right),
			},
			UnaryOp { op, operand } => UnaryOp { op, operand: f(operand) },
			BoolOp { op, values } => BoolOp {
				op,
				values: map_all(values, &mut f),
			},
			Tuple { elts } => Tuple {
				elts: map_all(elts, &mut f),
			},
			List { elts } => List {
				elts: map_all(elts, &mut f),
			},
			leaf @ (Pass | Name { .. } | Int { .. } | Str { .. } | Bool { .. }) => leaf,
		}
	}

	/// Checks whether the node is a statement rather than an expression
	pub fn is_statement(&self) -> bool {
		use NodeKind::*;
		matches!(
			self,
			FunctionDef { .. }
				| Assign { .. } | AugAssign { .. }
				| If { .. } | For { .. }
				| ExprStmt { .. } | Raise { .. }
				| Return { .. } | Pass
		)
	}
}

/// A single node of the syntax tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyntaxNode {
	#[serde(flatten)]
	pub kind: NodeKind,
	#[serde(default)]
	pub loc: SourceLoc,
}
