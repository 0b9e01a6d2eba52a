//! Persistent per-context cell storage.
//!
//! # Purpose
//!
//! A [`Context`] is one execution context's private view of every context-local cell.
//! It is the storage primitive the registry layer builds on: `store`, `load`, `undo`
//! and `fork`, nothing more.
//!
//! # Mental model
//!
//! * The cell map lives behind an `Arc`. Forking clones the `Arc` (O(1)).
//! * The first write after a fork copies the map (`Arc::make_mut`), so writes in one
//!   branch are never visible in the other.
//! * A cell that was never written is physically absent. Logical deletion is an
//!   explicit [`RawValue::Deleted`] entry, never a removal.
//!
//! # Invariants
//!
//! - Writes in a fork must not be visible to its parent or siblings.
//!   - Enforced in: [`Context::store`] (copy-on-write).
//!   - Tested by: `tests::fork_is_isolated_both_ways`
//! - A token can only be undone in the context that issued it, and only once.
//!   - Enforced in: [`Context::undo`] (context id check, token consumed by value).
//!   - Tested by: `tests::undo_rejects_foreign_context`

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use crate::value::RawValue;


/// Process-unique identity of one context-local cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u64);

impl CellId {
	/// Allocates a fresh cell id. Ids are never reused.
	pub fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}

	/// Returns the numeric id.
	pub const fn as_u64(self) -> u64 {
		self.0
	}
}

/// Identity of one execution context. Forks receive a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
	fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}

	/// Returns the numeric id.
	pub const fn as_u64(self) -> u64 {
		self.0
	}
}

/// Failure to undo a write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
	/// The token was issued by a different context.
	#[error("token was created in a different context (issued by {issued:?}, used in {used:?})")]
	ForeignContext { issued: ContextId, used: ContextId },
	/// The token was issued for a different cell.
	#[error("token was created by a different cell (issued for {issued:?}, used for {used:?})")]
	ForeignCell { issued: CellId, used: CellId },
}

/// Receipt for one [`Context::store`], able to restore the prior physical state.
#[derive(Debug)]
#[must_use = "dropping a token discards the ability to undo the write"]
pub struct Token {
	context: ContextId,
	cell: CellId,
	prior: Option<RawValue>,
}

impl Token {
	/// Cell this token was issued for.
	pub fn cell(&self) -> CellId {
		self.cell
	}

	/// Context this token was issued in.
	pub fn context(&self) -> ContextId {
		self.context
	}

	/// Physical state of the cell before the write (`None` = never written).
	pub fn prior(&self) -> Option<&RawValue> {
		self.prior.as_ref()
	}
}

/// One execution context's private, structurally shared view of all cells.
#[derive(Debug)]
pub struct Context {
	id: ContextId,
	cells: Arc<FxHashMap<CellId, RawValue>>,
}

impl Default for Context {
	fn default() -> Self {
		Self::new()
	}
}

impl Context {
	/// Creates an empty context in which every cell is unset.
	pub fn new() -> Self {
		Self {
			id: ContextId::next(),
			cells: Arc::default(),
		}
	}

	/// Returns this context's identity.
	pub fn id(&self) -> ContextId {
		self.id
	}

	/// Creates an isolated copy sharing all current values (O(1)).
	pub fn fork(&self) -> Self {
		Self {
			id: ContextId::next(),
			cells: Arc::clone(&self.cells),
		}
	}

	/// Returns the physical state of `cell`, or `None` if it was never written here.
	pub fn load(&self, cell: CellId) -> Option<&RawValue> {
		self.cells.get(&cell)
	}

	/// Writes `raw` into `cell`, returning a token that can undo the write.
	pub fn store(&mut self, cell: CellId, raw: RawValue) -> Token {
		let prior = Arc::make_mut(&mut self.cells).insert(cell, raw);
		Token {
			context: self.id,
			cell,
			prior,
		}
	}

	/// Restores the physical state captured by `token`.
	pub fn undo(&mut self, token: Token) -> Result<(), TokenError> {
		if token.context != self.id {
			return Err(TokenError::ForeignContext {
				issued: token.context,
				used: self.id,
			});
		}
		let cells = Arc::make_mut(&mut self.cells);
		match token.prior {
			Some(prior) => {
				cells.insert(token.cell, prior);
			}
			None => {
				cells.remove(&token.cell);
			}
		}
		Ok(())
	}

	/// Returns true if `cell` was ever written in this context.
	pub fn contains(&self, cell: CellId) -> bool {
		self.cells.contains_key(&cell)
	}

	/// Number of cells physically written in this context.
	pub fn len(&self) -> usize {
		self.cells.len()
	}

	/// Returns true if no cell was ever written in this context.
	pub fn is_empty(&self) -> bool {
		self.cells.is_empty()
	}

	/// Iterates over every physically written cell, in no particular order.
	pub fn iter(&self) -> impl Iterator<Item = (CellId, &RawValue)> {
		self.cells.iter().map(|(id, raw)| (*id, raw))
	}

	/// Returns true if both contexts share the same underlying map.
	pub fn shares_storage_with(&self, other: &Context) -> bool {
		Arc::ptr_eq(&self.cells, &other.cells)
	}
}
