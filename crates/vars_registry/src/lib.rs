//! Context-local variable registries.
//!
//! A registry type declares a set of named variables whose values live in the
//! current execution context (see [`ctxvars_context`]). Each declared or dynamically
//! allocated name is backed by exactly one [`Slot`], and every registry instance of
//! the type reads and writes through the same slots.
//!
//! # Layers
//!
//! | Layer | Type | Role |
//! |---|---|---|
//! | cell | [`Slot`] | context-local cell plus name and default policy |
//! | protocol | [`Accessor`], [`TypedAccessor`] | get / set / delete / reset over one slot |
//! | declaration | [`FieldDecl`], [`classify`] | which members become slots |
//! | type | [`Schema`], [`SchemaBuilder`] | name → accessor table, inheritance, dynamic allocation |
//! | instance | [`Registry`], [`ScopeGuard`] | attribute and mapping access, temporary overrides |
//! | persistence | [`Snapshot`], [`save`], [`restore`] | bulk save and restore |
//! | call site | [`Injector`], [`Args`] | context variables as named closure arguments |
//!
//! Types are usually declared with [`context_vars!`].
//!
//! # Logging
//!
//! Schema construction and first-write allocation log at `debug`, deferred default
//! evaluation and scope/snapshot activity at `trace`, and typed fallbacks and
//! inheritance overrides at `warn`. Every event carries `domain = "vars"`.

pub mod accessor;
pub mod decl;
pub mod error;
pub mod inject;
mod macros;
pub mod registry;
pub mod schema;
pub mod scope;
pub mod slot;
pub mod snapshot;

#[cfg(any(test, doc))]
pub(crate) mod invariants;

#[cfg(test)]
use tokio as _;

pub use accessor::{Accessor, TypedAccessor};
pub use ctxvars_context::{self as context, Context, FromValue, RawValue, Value};
pub use decl::{Annotation, Classification, FieldDecl, Init, classify};
pub use error::{Error, Result};
pub use inject::{Args, Injector};
pub use registry::{ContextVars, Registry};
pub use schema::{InheritancePolicy, Schema, SchemaBuilder};
pub use scope::ScopeGuard;
pub use slot::{DeferredFn, Slot, SlotDefault, SlotToken};
pub use snapshot::{Snapshot, restore, save};
