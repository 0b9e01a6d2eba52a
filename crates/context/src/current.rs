//! The ambient context of the running thread.
//!
//! Every OS thread owns exactly one current [`Context`]. New threads start with an
//! empty one; use [`crate::spawn_thread`] or [`crate::with_snapshot`] to carry values
//! across. [`Context::run`] temporarily installs another context as current.
//!
//! Closures passed to [`with`] and [`with_mut`] run while the current context is
//! borrowed and must not call back into this module.

use std::cell::RefCell;

use crate::context::{CellId, Context, Token, TokenError};
use crate::value::RawValue;

thread_local! {
	static CURRENT: RefCell<Context> = RefCell::new(Context::new());
}

/// Runs `f` with shared access to the current context.
pub fn with<R>(f: impl FnOnce(&Context) -> R) -> R {
	CURRENT.with(|current| f(&current.borrow()))
}

/// Runs `f` with exclusive access to the current context.
pub fn with_mut<R>(f: impl FnOnce(&mut Context) -> R) -> R {
	CURRENT.with(|current| f(&mut current.borrow_mut()))
}

/// Returns an isolated copy of the current context.
pub fn fork() -> Context {
	with(Context::fork)
}

/// Returns a clone of the physical state of `cell` in the current context.
pub fn load(cell: CellId) -> Option<RawValue> {
	with(|ctx| ctx.load(cell).cloned())
}

/// Writes `raw` into `cell` in the current context.
pub fn store(cell: CellId, raw: RawValue) -> Token {
	with_mut(|ctx| ctx.store(cell, raw))
}

/// Undoes a write made in the current context.
pub fn undo(token: Token) -> Result<(), TokenError> {
	with_mut(|ctx| ctx.undo(token))
}

fn replace(ctx: Context) -> Context {
	CURRENT.with(|current| std::mem::replace(&mut *current.borrow_mut(), ctx))
}

impl Context {
	/// Runs `f` with this context installed as the thread's current context.
	///
	/// Writes made by `f` are kept in `self` afterwards. The previously current
	/// context is reinstated on return, including when `f` unwinds.
	pub fn run<R>(&mut self, f: impl FnOnce() -> R) -> R {
		let entered = std::mem::replace(self, Context::new());
		let outer = replace(entered);
		let _restore = Restore {
			target: self,
			outer: Some(outer),
		};
		f()
	}
}

struct Restore<'a> {
	target: &'a mut Context,
	outer: Option<Context>,
}

impl Drop for Restore<'_> {
	fn drop(&mut self) {
		if let Some(outer) = self.outer.take() {
			*self.target = replace(outer);
		}
	}
}
