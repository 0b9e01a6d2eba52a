//! Execution-context storage.
//!
//! Values are isolated per execution context (thread, task) and forking a context is
//! O(1). This crate is the storage primitive only: it knows cells by [`CellId`] and
//! their state as [`RawValue`]. Naming, defaults and classification live in
//! `ctxvars-registry`.
//!
//! # Capability
//!
//! | Operation | Meaning |
//! |---|---|
//! | [`Context::store`] | write a cell, returning an undo [`Token`] |
//! | [`Context::load`] | read a cell (`None` = never written) |
//! | [`Context::undo`] | restore the state captured by a token |
//! | [`Context::fork`] | O(1) isolated copy |
//!
//! The [`current`] module exposes the thread's ambient context; [`Context::run`],
//! the [`bind`] helpers, [`spawn_thread`] and [`FutureExt`] move contexts across
//! threads and tasks explicitly.

pub mod bind;
mod context;
pub mod current;
pub mod future;
mod spawn;
pub mod value;

pub use bind::{with_empty, with_sandbox, with_snapshot};
pub use context::{CellId, Context, ContextId, Token, TokenError};
pub use future::{FutureExt, WithContext};
#[cfg(feature = "tokio")]
pub use spawn::spawn;
pub use spawn::{spawn_named_thread, spawn_thread};
pub use value::{FromValue, Opaque, RawValue, Value};
