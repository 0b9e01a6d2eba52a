//! Temporary overrides that restore on drop.

use std::fmt;

use ctxvars_context::{RawValue, Value};

use crate::accessor::Accessor;
use crate::error::Result;
use crate::schema::Schema;

/// Restores the overridden slots of one scope entry when dropped.
///
/// Restoration writes the exact prior logical state (a value, `Deleted` or
/// `Unset`) back into whatever context is current at drop time, in reverse order
/// of entry. Guards must be dropped in LIFO order to nest correctly.
#[must_use = "dropping the guard immediately ends the scope"]
pub struct ScopeGuard {
	saved: Vec<(Accessor, RawValue)>,
}

impl fmt::Debug for ScopeGuard {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list()
			.entries(self.saved.iter().map(|(accessor, _)| accessor.name()))
			.finish()
	}
}

impl ScopeGuard {
	/// Sets every pair, remembering prior states.
	///
	/// On a failing name, the writes already made are undone before the error is
	/// returned.
	pub(crate) fn enter<I, K, V>(schema: &Schema, pairs: I) -> Result<Self>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<Value>,
	{
		let mut guard = Self { saved: Vec::new() };
		for (name, value) in pairs {
			let accessor = schema.resolve_for_write(name.as_ref())?;
			let prior = accessor.load_raw();
			let _ = accessor.set(value);
			guard.saved.push((accessor, prior));
		}
		tracing::trace!(domain = "vars", schema = schema.type_name(), overrides = guard.saved.len(), "scope entered");
		Ok(guard)
	}

	/// Number of overridden slots.
	pub fn len(&self) -> usize {
		self.saved.len()
	}

	/// True if the scope overrides nothing.
	pub fn is_empty(&self) -> bool {
		self.saved.is_empty()
	}
}

impl Drop for ScopeGuard {
	fn drop(&mut self) {
		for (accessor, prior) in self.saved.drain(..).rev() {
			let _ = accessor.set_raw(prior);
		}
	}
}
