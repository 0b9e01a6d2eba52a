//! User-facing registry instances.
//!
//! A [`Registry`] holds no state of its own: every read and write is routed by
//! name through its type's [`Schema`] to an [`Accessor`], which operates on the
//! current execution context. Two instances of one type therefore always agree.
//!
//! Two access styles are offered over the same slots:
//!
//! * attribute style: [`Registry::get`], [`Registry::set`], [`Registry::delete`];
//! * mapping style: [`Registry::contains`], [`Registry::len`], [`Registry::items`],
//!   [`Registry::update`], [`Registry::pop`], … which only ever see slots that are
//!   gettable in the current context.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use ctxvars_context::{FromValue, Value};
use indexmap::IndexMap;

use crate::accessor::{Accessor, TypedAccessor};
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::scope::ScopeGuard;

/// A declaring type with a once-built schema.
///
/// Usually implemented through [`crate::context_vars!`].
pub trait ContextVars {
	/// The schema shared by every instance of the type.
	fn schema() -> &'static Arc<Schema>;

	/// A registry instance routed through [`ContextVars::schema`].
	fn registry() -> Registry {
		Registry::new(Arc::clone(Self::schema()))
	}
}

/// Attribute- and mapping-style view over the slots of one schema.
#[derive(Debug, Clone)]
pub struct Registry {
	schema: Arc<Schema>,
}

impl Registry {
	/// Creates an instance of the type described by `schema`.
	pub fn new(schema: Arc<Schema>) -> Self {
		Self { schema }
	}

	/// The schema this instance routes through.
	pub fn schema(&self) -> &Arc<Schema> {
		&self.schema
	}

	fn missing(&self, name: &str) -> Error {
		Error::MissingAttribute {
			type_name: self.schema.type_name().to_string(),
			name: name.to_string(),
		}
	}

	/// Accessor of an allocated slot.
	pub fn accessor(&self, name: &str) -> Option<Accessor> {
		self.schema.resolve(name)
	}

	/// Typed accessor of an allocated slot.
	pub fn typed<T: FromValue>(&self, name: &str) -> Option<TypedAccessor<T>> {
		self.accessor(name).map(|a| a.typed())
	}

	/// Reads attribute `name`.
	///
	/// Static fields read as their declared value. Unknown names and slots without a
	/// resolvable value both fail with [`Error::MissingAttribute`].
	pub fn get(&self, name: &str) -> Result<Value> {
		if let Some(accessor) = self.schema.resolve(name) {
			return accessor.get().map_err(|err| match err {
				Error::NotSet { .. } => self.missing(name),
				other => other,
			});
		}
		self.schema
			.static_field(name)
			.cloned()
			.ok_or_else(|| self.missing(name))
	}

	/// Reads attribute `name`, or returns `fallback` when it is missing.
	pub fn get_or(&self, name: &str, fallback: impl Into<Value>) -> Value {
		match self.schema.resolve(name) {
			Some(accessor) => accessor.get_or(fallback),
			None => match self.schema.static_field(name) {
				Some(value) => value.clone(),
				None => fallback.into(),
			},
		}
	}

	/// True iff attribute `name` currently has a readable value.
	pub fn has(&self, name: &str) -> bool {
		match self.schema.resolve(name) {
			Some(accessor) => accessor.is_gettable(),
			None => self.schema.static_field(name).is_some(),
		}
	}

	/// Writes attribute `name`, allocating a slot for an undeclared name when the
	/// type allows it.
	pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
		let _ = self.schema.resolve_for_write(name)?.set(value);
		Ok(())
	}

	/// Deletes attribute `name` in the current context.
	pub fn delete(&self, name: &str) -> Result<()> {
		let accessor = self.schema.resolve(name).ok_or_else(|| self.missing(name))?;
		accessor.delete();
		Ok(())
	}

	/// Slots that are gettable in the current context, with their values.
	pub fn iter(&self) -> impl Iterator<Item = (Arc<str>, Value)> {
		self.schema
			.slots()
			.into_iter()
			.filter_map(|(name, accessor)| accessor.get().ok().map(|value| (name, value)))
	}

	/// True iff `name` is an allocated slot that is gettable.
	pub fn contains(&self, name: &str) -> bool {
		self.schema
			.resolve(name)
			.is_some_and(|accessor| accessor.is_gettable())
	}

	/// Number of gettable slots.
	pub fn len(&self) -> usize {
		self.schema
			.slots()
			.iter()
			.filter(|(_, accessor)| accessor.is_gettable())
			.count()
	}

	/// True iff no slot is gettable.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Names of gettable slots.
	pub fn keys(&self) -> Vec<Arc<str>> {
		self.schema
			.slots()
			.into_iter()
			.filter(|(_, accessor)| accessor.is_gettable())
			.map(|(name, _)| name)
			.collect()
	}

	/// Values of gettable slots.
	pub fn values(&self) -> Vec<Value> {
		self.iter().map(|(_, value)| value).collect()
	}

	/// Name/value pairs of gettable slots.
	pub fn items(&self) -> Vec<(Arc<str>, Value)> {
		self.iter().collect()
	}

	/// Ordered map of gettable slots.
	pub fn to_map(&self) -> IndexMap<Arc<str>, Value> {
		self.iter().collect()
	}

	/// Sets every pair, in order. Stops at the first failing name.
	pub fn update<I, K, V>(&self, pairs: I) -> Result<()>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<Value>,
	{
		for (name, value) in pairs {
			self.set(name.as_ref(), value)?;
		}
		Ok(())
	}

	/// Removes `name` and returns its value. Fails unless the slot is gettable.
	pub fn pop(&self, name: &str) -> Result<Value> {
		let accessor = self.schema.resolve(name).ok_or_else(|| self.missing(name))?;
		let value = accessor.get().map_err(|_| self.missing(name))?;
		accessor.delete();
		Ok(value)
	}

	/// Like [`Registry::pop`], returning `fallback` instead of failing.
	pub fn pop_or(&self, name: &str, fallback: impl Into<Value>) -> Value {
		self.pop(name).unwrap_or_else(|_| fallback.into())
	}

	/// Returns the stored value of `name`, storing `value` first if none is stored.
	pub fn set_default(&self, name: &str, value: impl Into<Value>) -> Result<Value> {
		Ok(self.schema.resolve_for_write(name)?.set_if_not_set(value))
	}

	/// Deletes every gettable slot in the current context.
	pub fn clear(&self) {
		for (_, accessor) in self.schema.slots() {
			if accessor.is_gettable() {
				accessor.delete();
			}
		}
	}

	/// Temporarily overrides the named attributes until the guard is dropped.
	pub fn scope<I, K, V>(&self, pairs: I) -> Result<ScopeGuard>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<Value>,
	{
		ScopeGuard::enter(&self.schema, pairs)
	}

	/// Runs `f` with the named attributes overridden, restoring them afterwards.
	pub fn with_scope<I, K, V, R>(&self, pairs: I, f: impl FnOnce() -> R) -> Result<R>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<Value>,
	{
		let _guard = self.scope(pairs)?;
		Ok(f())
	}
}
