//! Per-type attribute tables.
//!
//! # Purpose
//!
//! A [`Schema`] maps attribute names of one declaring type to [`Accessor`]s. It is
//! built once from the type's [`FieldDecl`]s (see [`crate::decl::classify`]) and
//! shared by every registry instance of that type.
//!
//! # Mental model
//!
//! * Declared slots, static fields and excluded names are fixed at build time.
//! * Slots for undeclared names are allocated on first write and appended to a
//!   separately published table (see [`dynamic`]), when the type allows it.
//! * Parent schemas contribute their declared slots by identity: a subtype that does
//!   not re-declare a name reads and writes the very same cell as its parent.
//!
//! # Invariants
//!
//! - Must create at most one slot per (type, name), even under concurrent first writes.
//!   - Enforced in: `DynamicSlots::get_or_allocate` (allocation lock + re-check).
//!   - Tested by: [`crate::invariants::test_single_slot_under_concurrent_first_write`]
//!   - Failure symptom: two contexts write "the same" variable into different cells.
//! - Must never silently merge conflicting inherited slots under [`InheritancePolicy::Reject`].
//!   - Enforced in: [`SchemaBuilder::build`].
//!   - Tested by: `tests::reject_policy_refuses_redeclaration`
//!   - Failure symptom: a subtype write is invisible through the parent type.

mod dynamic;

use std::fmt;
use std::sync::Arc;

use ctxvars_context::Value;
use indexmap::{IndexMap, IndexSet};

use self::dynamic::{DynamicSlots, SlotTable};
use crate::accessor::Accessor;
use crate::decl::{Classification, FieldDecl, classify, is_reserved};
use crate::error::{Error, Result};
use crate::slot::Slot;

/// What happens when a declaring type re-declares a name it inherits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InheritancePolicy {
	/// Fail with [`Error::Inheritance`].
	#[default]
	Reject,
	/// The newer declaration shadows the inherited one with a fresh slot.
	/// Between parents, the later-listed parent wins.
	Override,
}

/// Immutable name → accessor table of one declaring type.
pub struct Schema {
	type_name: Arc<str>,
	declared: SlotTable,
	statics: IndexMap<Arc<str>, Value>,
	excluded: IndexSet<Arc<str>>,
	dynamic_allocation: bool,
	policy: InheritancePolicy,
	dynamic: DynamicSlots,
}

impl fmt::Debug for Schema {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Schema")
			.field("type_name", &self.type_name)
			.field("declared", &self.declared.keys().collect::<Vec<_>>())
			.field("dynamic", &self.dynamic.table().keys().collect::<Vec<_>>())
			.field("statics", &self.statics.keys().collect::<Vec<_>>())
			.field("dynamic_allocation", &self.dynamic_allocation)
			.finish()
	}
}

impl Schema {
	/// Starts declaring a type named `type_name`.
	pub fn builder(type_name: impl Into<Arc<str>>) -> SchemaBuilder {
		SchemaBuilder {
			type_name: type_name.into(),
			parents: Vec::new(),
			fields: Vec::new(),
			dynamic_allocation: None,
			policy: InheritancePolicy::default(),
		}
	}

	/// Name of the declaring type.
	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	/// Whether unknown names may be allocated on first write.
	pub fn dynamic_allocation(&self) -> bool {
		self.dynamic_allocation
	}

	/// Inheritance policy this schema was built with.
	pub fn inheritance_policy(&self) -> InheritancePolicy {
		self.policy
	}

	/// Resolves `name` to an already allocated slot.
	pub fn resolve(&self, name: &str) -> Option<Accessor> {
		self.declared
			.get(name)
			.cloned()
			.or_else(|| self.dynamic.get(name))
	}

	/// Resolves `name` for writing, allocating a slot when the type allows it.
	pub fn resolve_for_write(&self, name: &str) -> Result<Accessor> {
		if let Some(accessor) = self.resolve(name) {
			return Ok(accessor);
		}
		if let Some(reason) = self.unwritable_reason(name) {
			return Err(Error::ReservedAttribute {
				type_name: self.type_name.to_string(),
				name: name.to_string(),
				reason,
			});
		}
		if !self.dynamic_allocation {
			return Err(Error::UndeclaredAttribute {
				type_name: self.type_name.to_string(),
				name: name.to_string(),
			});
		}
		Ok(self.dynamic.get_or_allocate(&self.type_name, name))
	}

	fn unwritable_reason(&self, name: &str) -> Option<&'static str> {
		if self.statics.contains_key(name) {
			Some("it is a static field")
		} else if self.excluded.contains(name) {
			Some("it is excluded from context-local storage")
		} else if is_reserved(name) {
			Some("the name is reserved")
		} else {
			None
		}
	}

	/// Value of a static (not context-local) field.
	pub fn static_field(&self, name: &str) -> Option<&Value> {
		self.statics.get(name)
	}

	/// Returns true if `name` is an excluded member.
	pub fn is_excluded(&self, name: &str) -> bool {
		self.excluded.contains(name)
	}

	/// Returns true if `name` was declared as a slot (directly or by inheritance).
	pub fn is_declared(&self, name: &str) -> bool {
		self.declared.contains_key(name)
	}

	/// Every allocated slot: declared slots in declaration order, then dynamically
	/// allocated slots in allocation order.
	pub fn slots(&self) -> Vec<(Arc<str>, Accessor)> {
		let dynamic = self.dynamic.table();
		self.declared
			.iter()
			.chain(dynamic.iter())
			.map(|(name, accessor)| (Arc::clone(name), accessor.clone()))
			.collect()
	}

	/// Number of allocated slots.
	pub fn slot_count(&self) -> usize {
		self.declared.len() + self.dynamic.len()
	}
}

/// Builder for a [`Schema`].
pub struct SchemaBuilder {
	type_name: Arc<str>,
	parents: Vec<Arc<Schema>>,
	fields: Vec<FieldDecl>,
	dynamic_allocation: Option<bool>,
	policy: InheritancePolicy,
}

impl SchemaBuilder {
	/// Inherits the declared members of `parent`. May be called repeatedly.
	pub fn extends(mut self, parent: &Arc<Schema>) -> Self {
		self.parents.push(Arc::clone(parent));
		self
	}

	/// Declares one member.
	pub fn field(mut self, field: FieldDecl) -> Self {
		self.fields.push(field);
		self
	}

	/// Declares several members, in order.
	pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDecl>) -> Self {
		self.fields.extend(fields);
		self
	}

	/// Allows or forbids first-write allocation of undeclared names.
	///
	/// Defaults to the first parent's setting, or `true` without parents.
	pub fn dynamic_allocation(mut self, enabled: bool) -> Self {
		self.dynamic_allocation = Some(enabled);
		self
	}

	/// Sets the policy for re-declared inherited names.
	pub fn inheritance(mut self, policy: InheritancePolicy) -> Self {
		self.policy = policy;
		self
	}

	/// Classifies every member and builds the schema.
	pub fn build(self) -> Result<Arc<Schema>> {
		let type_name = self.type_name;
		let policy = self.policy;

		let mut declared = SlotTable::new();
		let mut owners: IndexMap<Arc<str>, Arc<str>> = IndexMap::new();
		let mut statics = IndexMap::new();
		let mut excluded = IndexSet::new();

		for parent in &self.parents {
			for (name, accessor) in &parent.declared {
				match declared.get(name) {
					Some(existing) if existing.same_slot(accessor) => continue,
					Some(_) => {
						let first = owners.get(name).map_or("", |o| &**o);
						if policy == InheritancePolicy::Reject {
							return Err(Error::Inheritance {
								type_name: type_name.to_string(),
								name: name.to_string(),
								parent: first.to_string(),
							});
						}
						tracing::warn!(
							domain = "vars",
							schema = &*type_name,
							slot = &**name,
							shadowed = first,
							winner = parent.type_name(),
							"inherited context variable overridden by later parent",
						);
					}
					None => {}
				}
				declared.insert(Arc::clone(name), accessor.clone());
				owners.insert(Arc::clone(name), Arc::clone(&parent.type_name));
			}
			for (name, value) in &parent.statics {
				statics.insert(Arc::clone(name), value.clone());
			}
			excluded.extend(parent.excluded.iter().cloned());
		}

		for field in &self.fields {
			let classification = classify(&type_name, field)?;
			let name: Arc<str> = Arc::from(field.name.as_str());

			if let Some(owner) = owners.get(&name) {
				if policy == InheritancePolicy::Reject {
					return Err(Error::Inheritance {
						type_name: type_name.to_string(),
						name: field.name.clone(),
						parent: owner.to_string(),
					});
				}
				tracing::warn!(
					domain = "vars",
					schema = &*type_name,
					slot = field.name.as_str(),
					shadowed = &**owner,
					"inherited context variable re-declared",
				);
				owners.shift_remove(&name);
			}

			match classification {
				Classification::Slot(default) => {
					statics.shift_remove(&name);
					excluded.shift_remove(&name);
					let slot = Slot::new(&type_name, &field.name, default);
					declared.insert(name, Accessor::new(slot));
				}
				Classification::Static(value) => {
					declared.shift_remove(&name);
					excluded.shift_remove(&name);
					statics.insert(name, value);
				}
				Classification::Excluded => {
					declared.shift_remove(&name);
					statics.shift_remove(&name);
					excluded.insert(name);
				}
			}
		}

		let dynamic_allocation = self
			.dynamic_allocation
			.or_else(|| self.parents.first().map(|p| p.dynamic_allocation))
			.unwrap_or(true);

		tracing::debug!(
			domain = "vars",
			schema = &*type_name,
			slots = declared.len(),
			statics = statics.len(),
			excluded = excluded.len(),
			parents = self.parents.len(),
			dynamic_allocation,
			"schema built",
		);

		Ok(Arc::new(Schema {
			type_name,
			declared,
			statics,
			excluded,
			dynamic_allocation,
			policy,
			dynamic: DynamicSlots::new(),
		}))
	}
}
