//! Declaration surface consumed by schema construction.
//!
//! A declaring type is described by an ordered list of [`FieldDecl`]s. Each field is
//! classified exactly once, when the schema is built:
//!
//! 1. `Annotation::NotContextLocal` → static field, stored verbatim, never wrapped.
//! 2. Any other annotation → slot, whether or not it has an initializer.
//! 3. No annotation → slot, unless the initializer is a method or accessor marker or
//!    the name is reserved, in which case the field is excluded.

use std::fmt;
use std::sync::Arc;

use ctxvars_context::Value;

use crate::error::{Error, Result};
use crate::slot::{DeferredFn, SlotDefault};

/// Prefix reserved for registry configuration names.
pub const RESERVED_PREFIX: &str = "_var_";

/// Returns true for names that can never be slots.
pub fn is_reserved(name: &str) -> bool {
	name.starts_with(RESERVED_PREFIX)
		|| (name.len() > 4 && name.starts_with("__") && name.ends_with("__"))
}

/// Type annotation carried by a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
	/// No annotation.
	None,
	/// A value-type annotation; the type name is informational.
	Typed(&'static str),
	/// Explicit "not context-local" marker.
	NotContextLocal,
}

/// Initializer of a field.
#[derive(Clone, Default)]
pub enum Init {
	/// No initializer.
	#[default]
	Missing,
	/// Plain data. Becomes the static default of a slot.
	Value(Value),
	/// Zero-argument default producer, evaluated once per context.
	Deferred(DeferredFn),
	/// The member is a method (behaviour, not data).
	Method,
	/// The member is already an accessor and must not be wrapped again.
	Accessor,
}

impl fmt::Debug for Init {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Init::Missing => f.write_str("Missing"),
			Init::Value(v) => f.debug_tuple("Value").field(v).finish(),
			Init::Deferred(_) => f.write_str("Deferred(..)"),
			Init::Method => f.write_str("Method"),
			Init::Accessor => f.write_str("Accessor"),
		}
	}
}

/// One declared member of a declaring type.
#[derive(Debug, Clone)]
pub struct FieldDecl {
	pub name: String,
	pub annotation: Annotation,
	pub init: Init,
}

impl FieldDecl {
	/// Unannotated field with no initializer.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			annotation: Annotation::None,
			init: Init::Missing,
		}
	}

	/// Adds a value-type annotation.
	pub fn typed(mut self, type_name: &'static str) -> Self {
		self.annotation = Annotation::Typed(type_name);
		self
	}

	/// Marks the field as a static (not context-local) field.
	pub fn not_context_local(mut self) -> Self {
		self.annotation = Annotation::NotContextLocal;
		self
	}

	/// Sets a plain data initializer.
	pub fn value(mut self, value: impl Into<Value>) -> Self {
		self.init = Init::Value(value.into());
		self
	}

	/// Sets a deferred default producer.
	pub fn deferred<F>(mut self, f: F) -> Self
	where
		F: Fn() -> Value + Send + Sync + 'static,
	{
		self.init = Init::Deferred(Arc::new(f));
		self
	}

	/// Marks the member as a method.
	pub fn method(mut self) -> Self {
		self.init = Init::Method;
		self
	}

	/// Marks the member as an existing accessor.
	pub fn accessor(mut self) -> Self {
		self.init = Init::Accessor;
		self
	}
}

/// Outcome of classifying one field.
#[derive(Debug, Clone)]
pub enum Classification {
	/// Becomes a context-local slot with the given default policy.
	Slot(SlotDefault),
	/// Kept as a plain static field.
	Static(Value),
	/// Left alone entirely.
	Excluded,
}

/// Classifies `field` of `type_name`.
pub fn classify(type_name: &str, field: &FieldDecl) -> Result<Classification> {
	let reserved = |reason| Error::ReservedAttribute {
		type_name: type_name.to_string(),
		name: field.name.clone(),
		reason,
	};

	match field.annotation {
		Annotation::NotContextLocal => Ok(Classification::Static(match &field.init {
			Init::Value(v) => v.clone(),
			_ => Value::Null,
		})),
		Annotation::Typed(_) => {
			if is_reserved(&field.name) {
				return Err(reserved("the name is reserved"));
			}
			match &field.init {
				Init::Method | Init::Accessor => {
					Err(reserved("the member is a method or accessor, not data"))
				}
				init => Ok(Classification::Slot(slot_default(init))),
			}
		}
		Annotation::None => {
			if is_reserved(&field.name) {
				return Ok(Classification::Excluded);
			}
			match &field.init {
				Init::Method | Init::Accessor => Ok(Classification::Excluded),
				init => Ok(Classification::Slot(slot_default(init))),
			}
		}
	}
}

fn slot_default(init: &Init) -> SlotDefault {
	match init {
		Init::Value(v) => SlotDefault::Value(v.clone()),
		Init::Deferred(f) => SlotDefault::Deferred(Arc::clone(f)),
		Init::Missing | Init::Method | Init::Accessor => SlotDefault::None,
	}
}
