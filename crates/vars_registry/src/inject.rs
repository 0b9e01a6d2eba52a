//! Context variables as named arguments.
//!
//! An [`Injector`] is an ordered list of rules, each naming an argument and where its
//! value comes from: a registry attribute, an accessor, or a getter closure. At call
//! time the rules are evaluated in the caller's current context and the results are
//! handed to the wrapped closure as [`Args`].
//!
//! Arguments passed explicitly by the caller always win. Otherwise the first rule
//! that produces a value for a name wins; a rule whose variable is missing is
//! skipped, so the callee sees the argument as absent and applies its own default.

use std::fmt;
use std::sync::Arc;

use ctxvars_context::{FromValue, Value};
use indexmap::IndexMap;

use crate::accessor::Accessor;
use crate::error::{Error, Result};
use crate::registry::Registry;

/// Named arguments handed to an injected closure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
	values: IndexMap<Arc<str>, Value>,
}

impl Args {
	/// No arguments.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces `name`.
	pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
		self.insert(name, value);
		self
	}

	/// Adds or replaces `name`.
	pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
		self.values.insert(Arc::from(name), value.into());
	}

	/// Value of `name`, if present.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.values.get(name)
	}

	/// Value of `name` as `T`.
	///
	/// Fails with [`Error::NotSet`] when absent and [`Error::TypeMismatch`] when the
	/// value has another type.
	pub fn typed<T: FromValue>(&self, name: &str) -> Result<T> {
		let value = self.get(name).ok_or_else(|| Error::NotSet { name: name.to_string() })?;
		T::from_value(value).ok_or_else(|| Error::TypeMismatch {
			name: name.to_string(),
			expected: T::expected(),
			got: value.type_name(),
		})
	}

	/// Value of `name` as `T`, or `fallback` when absent or of another type.
	pub fn typed_or<T: FromValue>(&self, name: &str, fallback: T) -> T {
		self.typed(name).unwrap_or(fallback)
	}

	/// Returns true if `name` is present.
	pub fn contains(&self, name: &str) -> bool {
		self.values.contains_key(name)
	}

	/// Number of arguments.
	pub fn len(&self) -> usize {
		self.values.len()
	}

	/// Returns true if there are no arguments.
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Arguments in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.values.iter().map(|(name, value)| (&**name, value))
	}
}

type Getter = Arc<dyn Fn() -> Option<Value> + Send + Sync>;

#[derive(Clone)]
enum Source {
	Attribute { registry: Registry, attr: Arc<str> },
	Accessor(Accessor),
	Getter(Getter),
}

impl Source {
	fn fetch(&self) -> Option<Value> {
		match self {
			Source::Attribute { registry, attr } => registry.get(attr).ok(),
			Source::Accessor(accessor) => accessor.get().ok(),
			Source::Getter(getter) => getter(),
		}
	}
}

impl fmt::Debug for Source {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Source::Attribute { registry, attr } => {
				write!(f, "{}.{attr}", registry.schema().type_name())
			}
			Source::Accessor(accessor) => f.write_str(accessor.name()),
			Source::Getter(_) => f.write_str("<getter>"),
		}
	}
}

/// Ordered rules mapping argument names to context variable sources.
#[derive(Debug, Clone, Default)]
pub struct Injector {
	rules: Vec<(Arc<str>, Source)>,
}

impl Injector {
	/// An injector without rules.
	pub fn new() -> Self {
		Self::default()
	}

	/// Injects each of `names` from the same-named attribute of `registry`.
	pub fn registry<I, K>(mut self, registry: &Registry, names: I) -> Self
	where
		I: IntoIterator<Item = K>,
		K: AsRef<str>,
	{
		for name in names {
			let name: Arc<str> = Arc::from(name.as_ref());
			self.rules.push((
				Arc::clone(&name),
				Source::Attribute {
					registry: registry.clone(),
					attr: name,
				},
			));
		}
		self
	}

	/// Injects argument `name` from attribute `attr` of `registry`.
	pub fn attribute(mut self, name: &str, registry: &Registry, attr: &str) -> Self {
		self.rules.push((
			Arc::from(name),
			Source::Attribute {
				registry: registry.clone(),
				attr: Arc::from(attr),
			},
		));
		self
	}

	/// Injects argument `name` from `accessor`.
	pub fn accessor(mut self, name: &str, accessor: &Accessor) -> Self {
		self.rules.push((Arc::from(name), Source::Accessor(accessor.clone())));
		self
	}

	/// Injects argument `name` from `getter`; `None` leaves the argument absent.
	pub fn getter<F>(mut self, name: &str, getter: F) -> Self
	where
		F: Fn() -> Option<Value> + Send + Sync + 'static,
	{
		self.rules.push((Arc::from(name), Source::Getter(Arc::new(getter))));
		self
	}

	/// Number of rules.
	pub fn len(&self) -> usize {
		self.rules.len()
	}

	/// Returns true if there are no rules.
	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	/// Fills every argument missing from `explicit` from the current context.
	pub fn resolve(&self, mut explicit: Args) -> Args {
		let mut injected = 0usize;
		for (name, source) in &self.rules {
			if explicit.values.contains_key(name) {
				continue;
			}
			if let Some(value) = source.fetch() {
				explicit.values.insert(Arc::clone(name), value);
				injected += 1;
			}
		}
		tracing::trace!(domain = "vars", rules = self.rules.len(), injected, "arguments injected");
		explicit
	}

	/// Wraps `f` so that each call receives its arguments completed from the
	/// context current at call time.
	pub fn wrap<F, R>(self, f: F) -> impl Fn(Args) -> R
	where
		F: Fn(Args) -> R,
	{
		move |explicit| f(self.resolve(explicit))
	}
}

#[cfg(test)]
mod tests {
	use ctxvars_context::Context;

	use super::*;
	use crate::decl::FieldDecl;
	use crate::schema::Schema;
	use crate::slot::SlotDefault;

	fn current() -> Registry {
		Registry::new(
			Schema::builder("Current")
				.field(FieldDecl::new("timezone").typed("str").value("UTC"))
				.field(FieldDecl::new("locale").typed("str").value("en"))
				.field(FieldDecl::new("user_id").typed("int"))
				.build()
				.unwrap(),
		)
	}

	fn describe(args: Args) -> String {
		format!(
			"{} {} {}",
			args.typed_or("locale", String::from("-")),
			args.typed_or("timezone", String::from("-")),
			args.get("user_id").map_or("none".to_string(), Value::to_string),
		)
	}

	#[test]
	fn injects_registry_attributes() {
		let current = current();
		let print_vars = Injector::new()
			.registry(&current, ["locale", "timezone", "user_id"])
			.wrap(describe);

		assert_eq!(print_vars(Args::new()), "en UTC none");
		assert_eq!(print_vars(Args::new().with("timezone", "Antarctica/Troll")), "en Antarctica/Troll none");

		let seen = current
			.with_scope([("locale", "nb"), ("timezone", "Antarctica/Troll")], || print_vars(Args::new()))
			.unwrap();
		assert_eq!(seen, "nb Antarctica/Troll none");

		current.set("user_id", 42).unwrap();
		assert_eq!(print_vars(Args::new()), "en UTC 42");
	}

	#[test]
	fn explicit_routes_and_first_rule_wins() {
		let current = current();
		let tz = Accessor::standalone("tz", SlotDefault::Value(Value::from("CET")));
		let injector = Injector::new()
			.accessor("timezone", &tz)
			.attribute("lang", &current, "locale")
			.registry(&current, ["timezone"])
			.getter("request", || Some(Value::Int(7)))
			.getter("absent", || None);

		let args = injector.resolve(Args::new());
		assert_eq!(args.typed::<String>("timezone").unwrap(), "CET");
		assert_eq!(args.typed::<String>("lang").unwrap(), "en");
		assert_eq!(args.typed::<i64>("request").unwrap(), 7);
		assert!(!args.contains("absent"));
		assert_eq!(args.len(), 3);
	}

	#[test]
	fn missing_variables_stay_absent() {
		let current = current();
		current.delete("locale").unwrap();
		let args = Injector::new().registry(&current, ["locale", "user_id", "unknown"]).resolve(Args::new());
		assert!(args.is_empty());
		assert!(matches!(args.typed::<String>("locale"), Err(Error::NotSet { .. })));
	}

	#[test]
	fn values_come_from_the_calling_context() {
		let current = current();
		let read = Injector::new()
			.registry(&current, ["timezone"])
			.wrap(|args: Args| args.typed::<String>("timezone"));

		let mut other = Context::new();
		other.run(|| current.set("timezone", "GMT").unwrap());

		assert_eq!(read(Args::new()).unwrap(), "UTC");
		assert_eq!(other.run(|| read(Args::new())).unwrap(), "GMT");
	}

	#[test]
	fn typed_reports_mismatch() {
		let args = Args::new().with("port", "http");
		assert!(matches!(args.typed::<i64>("port"), Err(Error::TypeMismatch { expected: "int", .. })));
		assert_eq!(args.typed_or("port", 80i64), 80);
	}
}
