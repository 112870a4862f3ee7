// self
use crate::{
	_prelude::*,
	gate::{self, ArgumentBag, GateError, SafetyMode},
	invoke::{InvocationResult, Invoker, Operation},
};

/// Named operations exposed by one front end.
pub struct OperationRegistry<A> {
	operations: BTreeMap<String, Operation<A>>,
}
impl<A> OperationRegistry<A> {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self { operations: BTreeMap::new() }
	}

	/// Adds an operation; names must be unique.
	pub fn register(&mut self, operation: Operation<A>) -> Result<(), GateError> {
		let name = operation.name().to_string();

		if self.operations.contains_key(&name) {
			return Err(GateError::DuplicateOperation { name });
		}

		self.operations.insert(name, operation);

		Ok(())
	}

	/// Builder-style [`Self::register`].
	pub fn with(mut self, operation: Operation<A>) -> Result<Self, GateError> {
		self.register(operation)?;

		Ok(self)
	}

	/// Drops every operation `mode` would deny so it is never listed.
	pub fn bind(mut self, mode: SafetyMode) -> Self {
		self.operations.retain(|_, operation| gate::is_allowed(mode, operation.capability()));

		self
	}

	/// Looks up an operation by name.
	pub fn get(&self, name: &str) -> Option<&Operation<A>> {
		self.operations.get(name)
	}

	/// Exposed operations in name order.
	pub fn exposed(&self) -> impl Iterator<Item = &Operation<A>> {
		self.operations.values()
	}

	/// Number of exposed operations.
	pub fn len(&self) -> usize {
		self.operations.len()
	}

	/// Whether nothing is exposed.
	pub fn is_empty(&self) -> bool {
		self.operations.is_empty()
	}
}
impl<A> OperationRegistry<A>
where
	A: ArgumentBag,
{
	/// Resolves `name` and runs it through `invoker`; unknown names yield an error result.
	pub async fn invoke(
		&self,
		invoker: &Invoker,
		name: &str,
		args: A,
		mode_override: Option<SafetyMode>,
	) -> InvocationResult {
		match self.get(name) {
			Some(operation) => invoker.invoke(operation, args, mode_override).await,
			None => invoker.reject(&GateError::UnknownOperation { name: name.into() }.into()),
		}
	}
}
impl<A> Default for OperationRegistry<A> {
	fn default() -> Self {
		Self::new()
	}
}
impl<A> Debug for OperationRegistry<A> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_list().entries(self.operations.values()).finish()
	}
}
