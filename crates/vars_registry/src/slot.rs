//! Context-local cells with metadata.

use std::fmt;
use std::sync::Arc;

use ctxvars_context::{CellId, RawValue, Token, TokenError, Value, current};

/// Zero-argument function producing a default value, evaluated at most once per context.
pub type DeferredFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Default policy of a slot. A slot has a static default or a deferred one, never both.
#[derive(Clone, Default)]
pub enum SlotDefault {
	/// No default: reading an unset slot fails.
	#[default]
	None,
	/// Returned as-is for an unset slot, without being stored.
	Value(Value),
	/// Evaluated on the first read of an unset slot; the result is stored.
	Deferred(DeferredFn),
}

impl SlotDefault {
	/// Returns true unless this is [`SlotDefault::None`].
	pub fn is_some(&self) -> bool {
		!matches!(self, SlotDefault::None)
	}
}

impl fmt::Debug for SlotDefault {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SlotDefault::None => f.write_str("SlotDefault::None"),
			SlotDefault::Value(v) => f.debug_tuple("SlotDefault::Value").field(v).finish(),
			SlotDefault::Deferred(_) => f.write_str("SlotDefault::Deferred(..)"),
		}
	}
}

/// One context-local cell plus its metadata.
///
/// Exactly one slot exists per (declaring type, attribute name); once published
/// it lives for the rest of the process.
#[derive(Debug)]
pub struct Slot {
	cell: CellId,
	name: Arc<str>,
	attr: Arc<str>,
	default: SlotDefault,
}

impl Slot {
	pub(crate) fn new(owner: &str, attr: &str, default: SlotDefault) -> Self {
		Self::with_cell(owner, attr, CellId::next(), default)
	}

	/// Binds metadata to a cell that already exists.
	pub(crate) fn with_cell(owner: &str, attr: &str, cell: CellId, default: SlotDefault) -> Self {
		Self {
			cell,
			name: Arc::from(format!("{owner}.{attr}")),
			attr: Arc::from(attr),
			default,
		}
	}

	/// Identity of the underlying cell.
	pub fn cell(&self) -> CellId {
		self.cell
	}

	/// Fully qualified name, `<type>.<attribute>`.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Attribute name within the declaring type.
	pub fn attr(&self) -> &str {
		&self.attr
	}

	pub(crate) fn attr_arc(&self) -> &Arc<str> {
		&self.attr
	}

	/// Default policy.
	pub fn default(&self) -> &SlotDefault {
		&self.default
	}

	/// Logical state in the current context. Never-written reads as `Unset`.
	pub fn load(&self) -> RawValue {
		current::load(self.cell).unwrap_or_default()
	}

	/// Writes a logical state into the current context.
	pub fn store(&self, raw: RawValue) -> SlotToken {
		SlotToken(current::store(self.cell, raw))
	}

	/// Restores the state captured by `token`.
	pub fn undo(&self, token: SlotToken) -> Result<(), TokenError> {
		if token.0.cell() != self.cell {
			return Err(TokenError::ForeignCell {
				issued: token.0.cell(),
				used: self.cell,
			});
		}
		current::undo(token.0)
	}
}

/// Receipt for one slot write, consumed by [`crate::Accessor::reset`].
#[derive(Debug)]
#[must_use = "dropping a token discards the ability to reset the slot"]
pub struct SlotToken(Token);

impl SlotToken {
	/// Logical state of the slot before the write.
	pub fn prior(&self) -> RawValue {
		self.0.prior().cloned().unwrap_or_default()
	}
}
