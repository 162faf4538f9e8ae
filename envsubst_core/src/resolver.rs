use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::HashSet;

/// Maps a variable name to its replacement text. An empty string means the
/// name is unresolved.
pub trait Resolve {
	fn resolve(&self, name: &str) -> String;
}

impl<F> Resolve for F
where
	F: Fn(&str) -> String,
{
	fn resolve(&self, name: &str) -> String {
		self(name)
	}
}

/// Resolves names from the process environment. Unset and non-UTF-8 values
/// resolve to an empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct Environment;

impl Resolve for Environment {
	fn resolve(&self, name: &str) -> String {
		std::env::var(name).unwrap_or_default()
	}
}

/// Receives reports about names that no source could resolve.
pub trait Diagnostics {
	fn unresolved(&self, name: &str);
}

/// Reports unresolved names as `warn` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
	fn unresolved(&self, name: &str) {
		tracing::warn!(
			variable = name,
			"cannot find a value for variable ${{{name}}} in template"
		);
	}
}

/// Records unresolved names in the order they were reported.
#[derive(Debug, Default)]
pub struct CollectedDiagnostics {
	names: RefCell<Vec<String>>,
}

impl CollectedDiagnostics {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn names(&self) -> Vec<String> {
		self.names.borrow().clone()
	}

	pub fn is_empty(&self) -> bool {
		self.names.borrow().is_empty()
	}

	pub fn into_names(self) -> Vec<String> {
		self.names.into_inner()
	}
}

impl Diagnostics for CollectedDiagnostics {
	fn unresolved(&self, name: &str) {
		self.names.borrow_mut().push(name.to_string());
	}
}

impl<D: Diagnostics + ?Sized> Diagnostics for &D {
	fn unresolved(&self, name: &str) {
		(**self).unresolved(name);
	}
}

/// Reports to both collaborators, first then second.
impl<A: Diagnostics, B: Diagnostics> Diagnostics for (A, B) {
	fn unresolved(&self, name: &str) {
		self.0.unresolved(name);
		self.1.unresolved(name);
	}
}

/// Looks a name up in a variable map first and then in a fallback source
/// (normally the [`Environment`]).
///
/// A name that neither source resolves sets the [`missing`] flag and is
/// reported to the [`Diagnostics`] collaborator once per resolver, however
/// many times it appears in the input.
///
/// The flag and the report set use interior mutability, so a resolver must
/// not be shared between threads.
///
/// [`missing`]: LayeredResolver::missing
pub struct LayeredResolver<'a, F: ?Sized = Environment> {
	vars: &'a HashMap<String, String>,
	fallback: Option<&'a F>,
	diagnostics: &'a dyn Diagnostics,
	missing: Cell<bool>,
	reported: RefCell<HashSet<String>>,
}

impl<'a> LayeredResolver<'a, Environment> {
	/// Resolve from `vars` and then from the process environment.
	pub fn with_environment(
		vars: &'a HashMap<String, String>,
		diagnostics: &'a dyn Diagnostics,
	) -> Self {
		Self::new(vars, &Environment, diagnostics)
	}

	/// Resolve from `vars` only.
	pub fn without_fallback(
		vars: &'a HashMap<String, String>,
		diagnostics: &'a dyn Diagnostics,
	) -> Self {
		Self {
			vars,
			fallback: None,
			diagnostics,
			missing: Cell::new(false),
			reported: RefCell::new(HashSet::new()),
		}
	}
}

impl<'a, F: Resolve + ?Sized> LayeredResolver<'a, F> {
	pub fn new(
		vars: &'a HashMap<String, String>,
		fallback: &'a F,
		diagnostics: &'a dyn Diagnostics,
	) -> Self {
		Self {
			vars,
			fallback: Some(fallback),
			diagnostics,
			missing: Cell::new(false),
			reported: RefCell::new(HashSet::new()),
		}
	}

	/// Whether any lookup so far failed in every source.
	pub fn missing(&self) -> bool {
		self.missing.get()
	}

	fn report(&self, name: &str) {
		self.missing.set(true);

		if self.reported.borrow_mut().insert(name.to_string()) {
			self.diagnostics.unresolved(name);
		}
	}
}

impl<F: Resolve + ?Sized> Resolve for LayeredResolver<'_, F> {
	fn resolve(&self, name: &str) -> String {
		if let Some(value) = self.vars.get(name).filter(|value| !value.is_empty()) {
			return value.clone();
		}

		let value = self
			.fallback
			.map(|fallback| fallback.resolve(name))
			.unwrap_or_default();

		if value.is_empty() {
			self.report(name);
		}

		value
	}
}
