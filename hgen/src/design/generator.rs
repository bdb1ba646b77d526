use super::{Design, DesignError, FunctionId, GeneratorId, Operand, PortDirection, StmtId, VarId};

/// Hardware generator (module) - owner of variables and functions
#[derive(Clone, Debug)]
pub struct Generator {
	/// Self-reference
	pub(super) id: GeneratorId,

	/// Name of the generator
	pub name: String,

	/// Named variables, in declaration order
	pub variables: Vec<VarId>,

	/// Functions declared in the generator
	pub functions: Vec<FunctionId>,
}

impl Generator {
	pub(super) fn new(name: &str) -> Self {
		Self {
			id: GeneratorId { id: 0 },
			name: name.to_string(),
			variables: vec![],
			functions: vec![],
		}
	}

	pub fn id(&self) -> GeneratorId {
		self.id
	}
}

/// Function declared inside a generator
#[derive(Clone, Debug)]
pub struct Function {
	/// Self-reference
	pub(super) id: FunctionId,

	/// Parent generator
	pub generator: GeneratorId,

	/// Name of the function
	pub name: String,

	/// Function arguments, in declaration order
	pub inputs: Vec<VarId>,

	/// Width of the returned value (set by the first return statement)
	pub return_width: Option<u32>,
}

impl Function {
	pub(super) fn new(generator: GeneratorId, name: &str) -> Self {
		Self {
			id: FunctionId { id: 0 },
			generator,
			name: name.to_string(),
			inputs: vec![],
			return_width: None,
		}
	}

	pub fn id(&self) -> FunctionId {
		self.id
	}
}

/// References a generator in the design
#[derive(Clone)]
pub struct GeneratorHandle {
	design: Design,
	id: GeneratorId,
}

impl GeneratorHandle {
	pub(super) fn new(design: Design, id: GeneratorId) -> Self {
		Self { design, id }
	}

	pub fn id(&self) -> GeneratorId {
		self.id
	}

	pub fn design(&self) -> &Design {
		&self.design
	}

	pub fn name(&self) -> String {
		self.design.borrow().generator(self.id).name.clone()
	}

	/// Declares an internal variable
	pub fn var(&self, name: &str, width: u32, signed: bool) -> Result<VarId, DesignError> {
		self.design
			.borrow_mut()
			.new_base_variable(self.id, None, name, width, signed, PortDirection::Internal)
	}

	/// Declares an input port
	pub fn input(&self, name: &str, width: u32, signed: bool) -> Result<VarId, DesignError> {
		self.design
			.borrow_mut()
			.new_base_variable(self.id, None, name, width, signed, PortDirection::Input)
	}

	/// Declares an output port
	pub fn output(&self, name: &str, width: u32, signed: bool) -> Result<VarId, DesignError> {
		self.design
			.borrow_mut()
			.new_base_variable(self.id, None, name, width, signed, PortDirection::Output)
	}

	/// Looks up a named variable
	pub fn get_var(&self, name: &str) -> Option<VarId> {
		let core = self.design.borrow();
		let found = core
			.generator(self.id)
			.variables
			.iter()
			.copied()
			.find(|id| core.variable(*id).name == name);
		found
	}

	/// Returns all named variables in declaration order
	pub fn variables(&self) -> Vec<VarId> {
		self.design.borrow().generator(self.id).variables.clone()
	}

	/// Creates a new function in this generator
	pub fn function(&self, name: &str) -> Result<FunctionHandle, DesignError> {
		let id = self.design.borrow_mut().new_function(self.id, name)?;
		Ok(FunctionHandle::new(self.design.clone(), id))
	}
}

/// References a function in the design
#[derive(Clone)]
pub struct FunctionHandle {
	design: Design,
	id: FunctionId,
}

impl FunctionHandle {
	pub(super) fn new(design: Design, id: FunctionId) -> Self {
		Self { design, id }
	}

	pub fn id(&self) -> FunctionId {
		self.id
	}

	pub fn name(&self) -> String {
		self.design.borrow().function(self.id).name.clone()
	}

	/// Declares a function argument
	pub fn input(&self, name: &str, width: u32, signed: bool) -> Result<VarId, DesignError> {
		let mut core = self.design.borrow_mut();
		let generator = core.function(self.id).generator;
		let var = core.new_base_variable(generator, Some(self.id), name, width, signed, PortDirection::Input)?;
		core.function_mut(self.id).inputs.push(var);
		Ok(var)
	}

	/// Returns function arguments in declaration order
	pub fn inputs(&self) -> Vec<VarId> {
		self.design.borrow().function(self.id).inputs.clone()
	}

	/// Builds a return statement
	pub fn return_stmt(&self, value: Operand) -> Result<StmtId, DesignError> {
		self.design.borrow_mut().new_return(self.id, value)
	}
}
