mod builder;
pub mod node;
mod substitute;
mod tree;

pub use builder::TreeBuilder;
pub use node::{BinOpKind, BoolOpKind, CompareOp, NodeId, NodeKind, SourceLoc, SyntaxNode, UnaryOpKind};
pub use substitute::{substitute, Literal};
pub use tree::{SyntaxTree, TreeError};
