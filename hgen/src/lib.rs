pub mod design;
pub mod dump;

pub use design::{
	BinaryOp, Branch, Design, DesignError, FunctionHandle, FunctionId, GeneratorHandle, GeneratorId, Operand,
	PortDirection, SourceRef, StatementKind, StmtId, UnaryOp, VarId,
};
pub use dump::{dump_statements, DumpError, StatementPrinter};
