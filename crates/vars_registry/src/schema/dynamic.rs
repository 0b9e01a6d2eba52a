//! Slots allocated on first write.
//!
//! Readers load the published table without locking. Allocation takes the
//! per-schema lock, re-checks the published table, and only then creates and
//! publishes a new slot, so concurrent first writers of one name always end up
//! sharing a single slot.

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::accessor::Accessor;
use crate::slot::{Slot, SlotDefault};

pub(crate) type SlotTable = IndexMap<Arc<str>, Accessor>;

pub(crate) struct DynamicSlots {
	published: ArcSwap<SlotTable>,
	alloc_lock: Mutex<()>,
}

impl DynamicSlots {
	pub(crate) fn new() -> Self {
		Self {
			published: ArcSwap::from_pointee(SlotTable::new()),
			alloc_lock: Mutex::new(()),
		}
	}

	pub(crate) fn get(&self, name: &str) -> Option<Accessor> {
		self.published.load().get(name).cloned()
	}

	/// Current table, in allocation order.
	pub(crate) fn table(&self) -> Arc<SlotTable> {
		self.published.load_full()
	}

	pub(crate) fn len(&self) -> usize {
		self.published.load().len()
	}

	/// Returns the slot published under `name`, allocating it if needed.
	pub(crate) fn get_or_allocate(&self, owner: &str, name: &str) -> Accessor {
		if let Some(existing) = self.get(name) {
			return existing;
		}

		let _guard = self.alloc_lock.lock();
		let current = self.published.load_full();
		if let Some(existing) = current.get(name) {
			return existing.clone();
		}

		let accessor = Accessor::new(Slot::new(owner, name, SlotDefault::None));
		let mut next = SlotTable::clone(&current);
		next.insert(Arc::clone(accessor.slot().attr_arc()), accessor.clone());
		self.published.store(Arc::new(next));

		tracing::debug!(
			domain = "vars",
			schema = owner,
			slot = name,
			cell = accessor.slot().cell().as_u64(),
			"allocated context variable on first write",
		);
		accessor
	}
}
