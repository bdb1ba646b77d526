use super::node::{NodeId, NodeKind};
use super::tree::SyntaxTree;

/// Literal that can replace a name in a syntax tree
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
	Int(i64),
	Str(String),
	Bool(bool),
}

impl Literal {
	fn to_node_kind(&self) -> NodeKind {
		match self {
			Literal::Int(value) => NodeKind::Int { value: *value },
			Literal::Str(value) => NodeKind::Str { value: value.clone() },
			Literal::Bool(value) => NodeKind::Bool { value: *value },
		}
	}
}

/// Replaces every free occurrence of `name` in the subtree with a literal.
///
/// Subtrees not mentioning the name are shared, only the paths leading to
/// substituted names are copied. The original subtree is left untouched.
/// A nested loop rebinding the same name only has its iterable substituted.
pub fn substitute(tree: &mut SyntaxTree, node: NodeId, name: &str, value: &Literal) -> NodeId {
	if !tree.mentions(node, name) {
		return node;
	}

	let loc = tree.loc(node);
	let kind = tree.kind(node).clone();
	match kind {
		NodeKind::Name { id } if id == name => tree.add(value.to_node_kind(), loc),
		NodeKind::For {
			target,
			iter,
			body,
			orelse,
		} if matches!(tree.kind(target), NodeKind::Name { id } if id == name) => {
			let iter = substitute(tree, iter, name, value);
			tree.add(
				NodeKind::For {
					target,
					iter,
					body,
					orelse,
				},
				loc,
			)
		},
		other => {
			let mapped = other.map_children(|child| substitute(tree, child, name, value));
			tree.add(mapped, loc)
		},
	}
}
