//! Binding closures to a context.
//!
//! Each helper wraps a closure so that every call runs inside a chosen context,
//! independent of whatever context the caller happens to have at call time.

use crate::context::Context;
use crate::current;

/// Freezes the current context: every call runs `f` in a fresh fork of the
/// context as it was when `with_snapshot` was called.
///
/// Calls are isolated from each other as well as from the caller, so the
/// returned closure can be invoked repeatedly or handed to another thread.
pub fn with_snapshot<F, R>(mut f: F) -> impl FnMut() -> R
where
	F: FnMut() -> R,
{
	let snapshot = current::fork();
	move || snapshot.fork().run(&mut f)
}

/// Every call runs `f` in a brand new, empty context.
pub fn with_empty<F, R>(mut f: F) -> impl FnMut() -> R
where
	F: FnMut() -> R,
{
	move || Context::new().run(&mut f)
}

/// Every call runs `f` in a fork of the caller's context; writes made by `f`
/// are discarded when it returns.
pub fn with_sandbox<F, R>(mut f: F) -> impl FnMut() -> R
where
	F: FnMut() -> R,
{
	move || current::fork().run(&mut f)
}
