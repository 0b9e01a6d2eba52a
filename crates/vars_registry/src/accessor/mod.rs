//! Read/write/delete protocol over a single slot.
//!
//! # Resolution order
//!
//! 1. A stored value is returned as-is.
//! 2. A deleted slot fails with [`Error::NotSet`] (or yields the call-site fallback).
//! 3. An unset slot evaluates its deferred default once and stores the result, or
//!    returns its static default without storing it, or fails / yields the fallback.
//!
//! Deferred defaults are evaluated while the current context is not borrowed, so
//! they may read and write other context variables.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use ctxvars_context::{CellId, FromValue, RawValue, Value};

use crate::error::{Error, Result};
use crate::slot::{Slot, SlotDefault, SlotToken};


/// Named handle bound to one [`Slot`].
#[derive(Clone)]
pub struct Accessor {
	slot: Arc<Slot>,
}

impl fmt::Debug for Accessor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Accessor")
			.field("name", &self.slot.name())
			.field("cell", &self.slot.cell())
			.finish()
	}
}

impl Accessor {
	pub(crate) fn new(slot: Slot) -> Self {
		Self {
			slot: Arc::new(slot),
		}
	}

	/// Creates a free-standing accessor not attached to any schema.
	pub fn standalone(name: &str, default: SlotDefault) -> Self {
		Self::new(Slot::new("standalone", name, default))
	}

	/// Wraps an existing cell with a default policy.
	///
	/// The cell keeps whatever state it already has in every context; only reads of
	/// an unset cell are affected by `default`. Several accessors may share one cell.
	pub fn from_cell(name: &str, cell: CellId, default: SlotDefault) -> Self {
		Self::new(Slot::with_cell("standalone", name, cell, default))
	}

	/// The slot this accessor operates on.
	pub fn slot(&self) -> &Slot {
		&self.slot
	}

	/// Fully qualified slot name.
	pub fn name(&self) -> &str {
		self.slot.name()
	}

	/// Returns true if both accessors operate on the same slot.
	pub fn same_slot(&self, other: &Accessor) -> bool {
		Arc::ptr_eq(&self.slot, &other.slot)
	}

	fn not_set(&self) -> Error {
		Error::NotSet {
			name: self.slot.name().to_string(),
		}
	}

	/// Resolves the current value, or `None` when nothing is resolvable.
	fn resolve(&self) -> Option<Value> {
		match self.slot.load() {
			RawValue::Present(v) => Some(v),
			RawValue::Deleted => None,
			RawValue::Unset => match self.slot.default() {
				SlotDefault::Deferred(f) => {
					let value = f();
					tracing::trace!(domain = "vars", slot = self.slot.name(), "deferred default evaluated");
					let _ = self.slot.store(RawValue::Present(value.clone()));
					Some(value)
				}
				SlotDefault::Value(v) => Some(v.clone()),
				SlotDefault::None => None,
			},
		}
	}

	/// Returns the value in the current context.
	pub fn get(&self) -> Result<Value> {
		self.resolve().ok_or_else(|| self.not_set())
	}

	/// Returns the value, or `fallback` when nothing is resolvable.
	pub fn get_or(&self, fallback: impl Into<Value>) -> Value {
		self.resolve().unwrap_or_else(|| fallback.into())
	}

	/// Like [`Accessor::get`], but reports an unresolvable slot as its
	/// `Deleted`/`Unset` marker instead of failing.
	pub fn get_raw(&self) -> RawValue {
		match self.resolve() {
			Some(v) => RawValue::Present(v),
			None => match self.slot.load() {
				RawValue::Deleted => RawValue::Deleted,
				_ => RawValue::Unset,
			},
		}
	}

	/// Exact logical state in the current context, with no default resolution.
	pub fn load_raw(&self) -> RawValue {
		self.slot.load()
	}

	/// True iff a value is stored (defaults are ignored).
	pub fn is_set(&self) -> bool {
		self.is_set_with(false, false)
	}

	/// True iff [`Accessor::get`] would succeed.
	pub fn is_gettable(&self) -> bool {
		self.is_set_with(true, true)
	}

	/// Existence check with configurable treatment of defaults.
	///
	/// A stored value always counts. For an unset slot, `on_default` decides whether
	/// a static default counts and `on_deferred_default` whether a deferred one does.
	/// A deleted slot never counts.
	pub fn is_set_with(&self, on_default: bool, on_deferred_default: bool) -> bool {
		match self.slot.load() {
			RawValue::Present(_) => true,
			RawValue::Deleted => false,
			RawValue::Unset => match self.slot.default() {
				SlotDefault::Value(_) => on_default,
				SlotDefault::Deferred(_) => on_deferred_default,
				SlotDefault::None => false,
			},
		}
	}

	/// Stores `value`, returning a token that restores the prior state.
	pub fn set(&self, value: impl Into<Value>) -> SlotToken {
		self.slot.store(RawValue::Present(value.into()))
	}

	/// Writes a logical state verbatim, bypassing default resolution.
	pub fn set_raw(&self, raw: RawValue) -> SlotToken {
		self.slot.store(raw)
	}

	/// Stores `value` unless a value is already stored; returns the value in effect.
	pub fn set_if_not_set(&self, value: impl Into<Value>) -> Value {
		match self.slot.load() {
			RawValue::Present(existing) => existing,
			_ => {
				let value = value.into();
				let _ = self.set(value.clone());
				value
			}
		}
	}

	/// Restores the logical state captured by `token`.
	pub fn reset(&self, token: SlotToken) -> Result<()> {
		self.slot.undo(token).map_err(Error::from)
	}

	/// Marks the slot unset, so the next read resolves the default again.
	pub fn reset_to_default(&self) {
		let _ = self.slot.store(RawValue::Unset);
	}

	/// Logically erases the value. The underlying cell is never removed.
	pub fn delete(&self) {
		let _ = self.slot.store(RawValue::Deleted);
	}

	/// Typed view of this accessor.
	pub fn typed<T: FromValue>(&self) -> TypedAccessor<T> {
		TypedAccessor {
			inner: self.clone(),
			_marker: PhantomData,
		}
	}
}

/// Accessor with compile-time knowledge of the value type.
pub struct TypedAccessor<T: FromValue> {
	inner: Accessor,
	_marker: PhantomData<fn() -> T>,
}

impl<T: FromValue> Clone for TypedAccessor<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
			_marker: PhantomData,
		}
	}
}

impl<T: FromValue> fmt::Debug for TypedAccessor<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("TypedAccessor").field(&self.inner.name()).finish()
	}
}

impl<T: FromValue> TypedAccessor<T> {
	/// Returns the untyped accessor.
	pub fn untyped(&self) -> &Accessor {
		&self.inner
	}

	/// Returns the value, failing with [`Error::TypeMismatch`] on a foreign type.
	pub fn get(&self) -> Result<T> {
		let value = self.inner.get()?;
		T::from_value(&value).ok_or_else(|| Error::TypeMismatch {
			name: self.inner.name().to_string(),
			expected: T::expected(),
			got: value.type_name(),
		})
	}

	/// Returns the value, or `fallback` when it is missing or of a foreign type.
	pub fn get_or(&self, fallback: T) -> T {
		match self.get() {
			Ok(v) => v,
			Err(Error::TypeMismatch { name, expected, got }) => {
				tracing::warn!(
					domain = "vars",
					slot = name.as_str(),
					expected,
					got,
					"context variable type mismatch; falling back",
				);
				fallback
			}
			Err(_) => fallback,
		}
	}

	/// Stores `value`.
	pub fn set(&self, value: T) -> SlotToken
	where
		T: Into<Value>,
	{
		self.inner.set(value)
	}

	/// See [`Accessor::is_set`].
	pub fn is_set(&self) -> bool {
		self.inner.is_set()
	}

	/// See [`Accessor::reset`].
	pub fn reset(&self, token: SlotToken) -> Result<()> {
		self.inner.reset(token)
	}

	/// See [`Accessor::delete`].
	pub fn delete(&self) {
		self.inner.delete();
	}
}
