use crate::syntax::Literal;
use hgen::{Design, GeneratorHandle, VarId};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Signal-valued result of an evaluation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
	/// Hardware variable, either bound by name or constructed during evaluation
	Var(VarId),

	/// Signal-valued expression evaluated without constructing anything
	Deferred,
}

/// Compile-time value bound to a name
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
	Int(i64),
	Str(String),
	Bool(bool),
	List(Vec<Value>),
	Namespace(BTreeMap<String, Value>),
	#[serde(skip)]
	Signal(Signal),

	/// Name known to exist but without a usable value
	Unresolved,
}

impl Value {
	pub fn var(id: VarId) -> Self {
		Value::Signal(Signal::Var(id))
	}

	pub fn is_signal(&self) -> bool {
		matches!(self, Value::Signal(_))
	}

	/// Returns the hardware variable if the value is a constructed signal
	pub fn as_var(&self) -> Option<VarId> {
		match self {
			Value::Signal(Signal::Var(id)) => Some(*id),
			_ => None,
		}
	}

	/// Converts to a literal usable as a loop value
	pub fn to_literal(&self) -> Option<Literal> {
		match self {
			Value::Int(v) => Some(Literal::Int(*v)),
			Value::Str(v) => Some(Literal::Str(v.clone())),
			Value::Bool(v) => Some(Literal::Bool(*v)),
			_ => None,
		}
	}

	/// Short name of the value type for messages
	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Int(_) => "integer",
			Value::Str(_) => "string",
			Value::Bool(_) => "boolean",
			Value::List(_) => "list",
			Value::Namespace(_) => "namespace",
			Value::Signal(_) => "signal",
			Value::Unresolved => "unresolved value",
		}
	}

	/// Textual form attached to statements as debug metadata.
	/// Signals are named after the variable they refer to.
	pub fn describe(&self, design: &Design) -> String {
		match self {
			Value::Signal(Signal::Var(id)) => design.var_name(*id),
			Value::List(values) => format!("[{}]", values.iter().map(|v| v.describe(design)).join(", ")),
			other => other.to_string(),
		}
	}
}

impl From<Literal> for Value {
	fn from(literal: Literal) -> Self {
		match literal {
			Literal::Int(v) => Value::Int(v),
			Literal::Str(v) => Value::Str(v),
			Literal::Bool(v) => Value::Bool(v),
		}
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Int(value)
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::Str(value.into())
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Int(v) => write!(f, "{}", v),
			Value::Str(v) => write!(f, "{}", v),
			Value::Bool(true) => write!(f, "True"),
			Value::Bool(false) => write!(f, "False"),
			Value::List(values) => write!(f, "[{}]", values.iter().join(", ")),
			Value::Namespace(_) => write!(f, "<namespace>"),
			Value::Signal(_) => write!(f, "<signal>"),
			Value::Unresolved => write!(f, "<unresolved>"),
		}
	}
}

/// Explicit mapping of names visible to compile-time evaluation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment {
	bindings: BTreeMap<String, Value>,
}

impl Environment {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn bind(&mut self, name: &str, value: Value) {
		self.bindings.insert(name.into(), value);
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self.bindings.get(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.bindings.iter()
	}

	/// Binds every named generator variable under its own name
	pub fn bind_generator_vars(&mut self, generator: &GeneratorHandle) {
		let design = generator.design();
		for var in generator.variables() {
			self.bind(&design.var_name(var), Value::var(var));
		}
	}
}

/// Namespace exposing all named variables of a generator (the `self` of a block)
pub fn generator_namespace(generator: &GeneratorHandle) -> Value {
	let design = generator.design();
	Value::Namespace(
		generator
			.variables()
			.into_iter()
			.map(|var| (design.var_name(var), Value::var(var)))
			.collect(),
	)
}
