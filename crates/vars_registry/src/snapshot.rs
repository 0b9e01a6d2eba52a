//! Save and restore the variables of one registry.
//!
//! A [`Snapshot`] records the exact logical state of every slot allocated at save
//! time. [`restore`] brings the current context back to that state: slots that were
//! allocated later are marked deleted, since they had no value when the snapshot
//! was taken.

use std::sync::Arc;

use ctxvars_context::RawValue;
use indexmap::IndexMap;

use crate::registry::Registry;

/// Logical state of a registry's slots at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
	entries: IndexMap<Arc<str>, RawValue>,
}

impl Snapshot {
	/// Saved state of `name`, if it was allocated at save time.
	pub fn get(&self, name: &str) -> Option<&RawValue> {
		self.entries.get(name)
	}

	/// Number of recorded slots.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// True if no slot was allocated at save time.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Recorded slots in schema order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
		self.entries.iter().map(|(name, raw)| (&**name, raw))
	}
}

/// Records the state of every allocated slot of `registry`.
pub fn save(registry: &Registry) -> Snapshot {
	Snapshot {
		entries: registry
			.schema()
			.slots()
			.into_iter()
			.map(|(name, accessor)| (name, accessor.load_raw()))
			.collect(),
	}
}

/// Writes `snapshot` back into the current context.
pub fn restore(registry: &Registry, snapshot: &Snapshot) {
	let mut restored = 0usize;
	for (name, accessor) in registry.schema().slots() {
		let raw = snapshot.entries.get(&name).cloned().unwrap_or(RawValue::Deleted);
		let _ = accessor.set_raw(raw);
		restored += 1;
	}
	tracing::trace!(
		domain = "vars",
		schema = registry.schema().type_name(),
		restored,
		"snapshot restored",
	);
}

#[cfg(test)]
mod tests {
	use ctxvars_context::Value;

	use super::*;
	use crate::decl::FieldDecl;
	use crate::schema::Schema;

	fn registry() -> Registry {
		Registry::new(
			Schema::builder("Vars")
				.field(FieldDecl::new("locale").value("en"))
				.field(FieldDecl::new("user_id").typed("int"))
				.build()
				.unwrap(),
		)
	}

	#[test]
	fn restore_brings_back_saved_state() {
		let vars = registry();
		vars.set("user_id", 1).unwrap();
		let saved = save(&vars);

		vars.set("user_id", 2).unwrap();
		vars.delete("locale").unwrap();
		restore(&vars, &saved);

		assert_eq!(vars.get("user_id").unwrap(), Value::Int(1));
		assert_eq!(vars.get("locale").unwrap(), Value::from("en"));
		assert_eq!(saved.get("locale"), Some(&RawValue::Unset));
	}

	#[test]
	fn slots_allocated_after_save_are_deleted() {
		let vars = registry();
		let saved = save(&vars);
		vars.set("request_id", "abc").unwrap();

		restore(&vars, &saved);
		assert!(!vars.has("request_id"));
		assert_eq!(vars.accessor("request_id").unwrap().load_raw(), RawValue::Deleted);
		assert_eq!(saved.len(), 2);
	}
}
