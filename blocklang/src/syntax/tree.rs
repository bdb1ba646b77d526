use super::node::{BoolOpKind, NodeId, NodeKind, SourceLoc, SyntaxNode, UnaryOpKind};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum TreeError {
	#[error("Node {node} refers to a non-existent node {child}")]
	DanglingReference { node: NodeId, child: NodeId },

	#[error("Node {node} refers to node {child} which is not defined before it")]
	ForwardReference { node: NodeId, child: NodeId },

	#[error("Node {0} does not exist")]
	NoSuchNode(NodeId),
}

/// Arena holding all nodes of a parsed function.
///
/// Nodes only refer to nodes stored before them, so the tree is acyclic.
/// Rewrites never modify existing nodes, they append new ones instead.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyntaxTree {
	nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
	pub fn new() -> Self {
		Self::default()
	}

	/// Loads a tree from its JSON representation. Call `validate` before use.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}

	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string_pretty(self)
	}

	/// Appends a new node
	pub fn add(&mut self, kind: NodeKind, loc: SourceLoc) -> NodeId {
		self.nodes.push(SyntaxNode { kind, loc });
		NodeId(self.nodes.len() - 1)
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn get(&self, id: NodeId) -> Option<&SyntaxNode> {
		self.nodes.get(id.0)
	}

	/// Returns a node. The ID must come from this tree.
	pub fn node(&self, id: NodeId) -> &SyntaxNode {
		&self.nodes[id.0]
	}

	pub fn kind(&self, id: NodeId) -> &NodeKind {
		&self.node(id).kind
	}

	pub fn loc(&self, id: NodeId) -> SourceLoc {
		self.node(id).loc
	}

	/// Checks that all child references point at earlier nodes
	pub fn validate(&self) -> Result<(), TreeError> {
		for (index, node) in self.nodes.iter().enumerate() {
			for child in node.kind.children() {
				if child.0 >= self.nodes.len() {
					return Err(TreeError::DanglingReference {
						node: NodeId(index),
						child,
					});
				}

				if child.0 >= index {
					return Err(TreeError::ForwardReference {
						node: NodeId(index),
						child,
					});
				}
			}
		}
		Ok(())
	}

	/// Checks whether a name is referenced anywhere in the subtree
	pub fn mentions(&self, id: NodeId, name: &str) -> bool {
		match self.kind(id) {
			NodeKind::Name { id } => id == name,
			kind => kind.children().into_iter().any(|child| self.mentions(child, name)),
		}
	}

	fn render_operand(&self, id: NodeId) -> String {
		match self.kind(id) {
			NodeKind::BinOp { .. } | NodeKind::BoolOp { .. } | NodeKind::Compare { .. } => {
				format!("({})", self.render(id))
			},
			_ => self.render(id),
		}
	}

	fn render_list(&self, ids: &[NodeId]) -> String {
		ids.iter().map(|id| self.render(*id)).join(", ")
	}

	/// Renders a node in surface syntax. Statement bodies are not rendered.
	pub fn render(&self, id: NodeId) -> String {
		use NodeKind::*;
		match self.kind(id) {
			FunctionDef { name, params, .. } => format!("def {}({}):", name, params.join(", ")),
			Assign { targets, value } => format!(
				"{} = {}",
				targets.iter().map(|t| self.render(*t)).join(" = "),
				self.render(*value)
			),
			AugAssign { target, op, value } => {
				format!("{} {}= {}", self.render(*target), op.symbol(), self.render(*value))
			},
			If { test, .. } => format!("if {}:", self.render(*test)),
			For { target, iter, .. } => format!("for {} in {}:", self.render(*target), self.render(*iter)),
			ExprStmt { value } => self.render(*value),
			Raise { exc: Some(exc) } => format!("raise {}", self.render(*exc)),
			Raise { exc: None } => "raise".into(),
			Return { value: Some(value) } => format!("return {}", self.render(*value)),
			Return { value: None } => "return".into(),
			Pass => "pass".into(),
			Name { id } => id.clone(),
			Int { value } => value.to_string(),
			Str { value } => format!("'{}'", value),
			Bool { value: true } => "True".into(),
			Bool { value: false } => "False".into(),
			Attribute { value, attr } => format!("{}.{}", self.render_operand(*value), attr),
			Subscript { value, index } => match self.kind(*index) {
				Tuple { elts } => format!("{}[{}]", self.render_operand(*value), self.render_list(elts)),
				_ => format!("{}[{}]", self.render_operand(*value), self.render(*index)),
			},
			Call { func, args } => format!("{}({})", self.render(*func), self.render_list(args)),
			BinOp { op, left, right } => format!(
				"{} {} {}",
				self.render_operand(*left),
				op.symbol(),
				self.render_operand(*right)
			),
			Compare { op, left, right } => format!(
				"{} {} {}",
				self.render_operand(*left),
				op.symbol(),
				self.render_operand(*right)
			),
			UnaryOp { op, operand } => match op {
				UnaryOpKind::Not => format!("not {}", self.render_operand(*operand)),
				UnaryOpKind::USub => format!("-{}", self.render_operand(*operand)),
				UnaryOpKind::Invert => format!("~{}", self.render_operand(*operand)),
			},
			BoolOp { op, values } => {
				let sep = match op {
					BoolOpKind::And => " and ",
					BoolOpKind::Or => " or ",
				};
				values.iter().map(|v| self.render_operand(*v)).join(sep)
			},
			Tuple { elts } if elts.len() == 1 => format!("({},)", self.render(elts[0])),
			Tuple { elts } => format!("({})", self.render_list(elts)),
			List { elts } => format!("[{}]", self.render_list(elts)),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::syntax::TreeBuilder;

	#[test]
	fn test_validate_forward_reference() {
		let json = r#"[
			{"kind": "Name", "id": "x", "loc": {"line": 1}},
			{"kind": "ExprStmt", "value": 2, "loc": {"line": 1}},
			{"kind": "Name", "id": "y", "loc": {"line": 1}}
		]"#;
		let tree = SyntaxTree::from_json(json).unwrap();
		assert!(matches!(tree.validate(), Err(TreeError::ForwardReference { .. })));

		let json = r#"[{"kind": "ExprStmt", "value": 7}]"#;
		let tree = SyntaxTree::from_json(json).unwrap();
		assert!(matches!(tree.validate(), Err(TreeError::DanglingReference { .. })));
	}

	#[test]
	fn test_render_expressions() {
		let mut b = TreeBuilder::new();
		let a = b.name("a");
		let bb = b.name("b");
		let c = b.name("c");
		let and = b.and(vec![a, bb]);
		let expr = b.or(vec![and, c]);
		let x = b.name("x");
		let hi = b.int(3);
		let lo = b.int(0);
		let slice = b.slice(x, hi, lo);
		let not = b.not(slice);
		let tree = b.finish();

		assert_eq!(tree.render(expr), "(a and b) or c");
		assert_eq!(tree.render(not), "not x[3, 0]");
		assert!(tree.mentions(expr, "b"));
		assert!(!tree.mentions(expr, "x"));
	}
}
