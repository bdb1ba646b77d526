mod eval_error;
mod interpreter;
mod value;

pub use eval_error::{CompileTimeEvalError, EvalError};
pub use interpreter::{Interpreter, DEFAULT_SEQUENCE_LIMIT};
pub use value::{generator_namespace, Environment, Signal, Value};
