#![allow(dead_code)]

use std::sync::{Arc, Barrier};
use std::thread;

use ctxvars_context::{Context, RawValue, Value};

use crate::decl::FieldDecl;
use crate::registry::Registry;
use crate::schema::Schema;

fn vars(type_name: &str) -> Registry {
	let schema = Schema::builder(type_name)
		.field(FieldDecl::new("locale").value("en"))
		.field(FieldDecl::new("user_id").typed("int"))
		.build()
		.expect("schema should build");
	Registry::new(schema)
}

/// Must create at most one slot per (type, name) under concurrent first writes.
///
/// * Enforced in: `DynamicSlots::get_or_allocate`
/// * Failure symptom: two threads write "the same" variable into different cells and
///   neither sees the other's value after a context hand-off.
#[cfg_attr(test, test)]
pub(crate) fn test_single_slot_under_concurrent_first_write() {
	const THREADS: usize = 8;
	let schema = Schema::builder("Racy").build().expect("schema should build");
	let barrier = Arc::new(Barrier::new(THREADS));

	let handles: Vec<_> = (0..THREADS)
		.map(|i| {
			let schema = Arc::clone(&schema);
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				let accessor = schema.resolve_for_write("request_id").expect("dynamic allocation is on");
				let _ = accessor.set(i as i64);
				accessor.slot().cell()
			})
		})
		.collect();

	let cells: Vec<_> = handles
		.into_iter()
		.map(|h| h.join().expect("writer thread panicked"))
		.collect();
	assert!(cells.windows(2).all(|w| w[0] == w[1]));
	assert_eq!(schema.slot_count(), 1);
}

/// Must isolate writes made in a forked context from its parent.
///
/// * Enforced in: `Context::fork`, `Context::store` (copy on write)
/// * Failure symptom: a request handler observes another request's user id.
#[cfg_attr(test, test)]
pub(crate) fn test_fork_isolates_writes() {
	let vars = vars("Forked");
	vars.set("user_id", 1).expect("declared");

	let mut child = ctxvars_context::current::fork();
	child.run(|| {
		assert_eq!(vars.get("user_id").expect("inherited"), Value::Int(1));
		vars.set("user_id", 2).expect("declared");
		vars.delete("locale").expect("declared");
	});

	assert_eq!(vars.get("user_id").expect("still set"), Value::Int(1));
	assert!(vars.has("locale"));
	child.run(|| assert_eq!(vars.get("user_id").expect("child value"), Value::Int(2)));
}

/// Must never physically remove a slot on delete.
///
/// * Enforced in: `Accessor::delete` (stores the `Deleted` marker)
/// * Failure symptom: a deleted variable reverts to its default, or a deleted
///   dynamic variable disappears from the schema and is reallocated with a new cell.
#[cfg_attr(test, test)]
pub(crate) fn test_delete_is_logical() {
	let vars = vars("Deleting");
	vars.set("trace", true).expect("dynamic allocation is on");
	let cell = vars.accessor("trace").expect("allocated").slot().cell();

	vars.delete("trace").expect("allocated");
	vars.delete("locale").expect("declared");

	assert!(!vars.has("locale"));
	assert_eq!(vars.accessor("locale").expect("declared").load_raw(), RawValue::Deleted);
	assert_eq!(vars.accessor("trace").expect("still allocated").slot().cell(), cell);
	assert_eq!(vars.schema().slot_count(), 3);
}

/// Must restore every overridden slot when a scope is left by unwinding.
///
/// * Enforced in: `ScopeGuard::drop`
/// * Failure symptom: a panicking handler leaks its temporary locale into later work.
#[cfg_attr(test, test)]
pub(crate) fn test_scope_restores_on_unwind() {
	let vars = vars("Unwinding");
	vars.set("user_id", 7).expect("declared");

	let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
		vars.with_scope([("locale", "fr"), ("user_id", "tmp")], || {
			assert_eq!(vars.get("locale").expect("scoped"), Value::from("fr"));
			panic!("handler failed");
		})
	}));

	assert!(result.is_err());
	assert_eq!(vars.get("locale").expect("default"), Value::from("en"));
	assert!(!vars.accessor("locale").expect("declared").is_set());
	assert_eq!(vars.get("user_id").expect("restored"), Value::Int(7));
}

/// Must run a context's deferred defaults at most once per context.
///
/// * Enforced in: `Accessor::resolve` (stores the produced value)
/// * Failure symptom: a lazily generated request id changes between reads.
#[cfg_attr(test, test)]
pub(crate) fn test_deferred_default_is_stable_per_context() {
	use std::sync::atomic::{AtomicI64, Ordering};

	static NEXT: AtomicI64 = AtomicI64::new(0);
	let schema = Schema::builder("Lazy")
		.field(FieldDecl::new("request_id").deferred(|| Value::Int(NEXT.fetch_add(1, Ordering::SeqCst))))
		.build()
		.expect("schema should build");
	let vars = Registry::new(schema);

	let mut fresh = Context::new();
	let first = fresh.run(|| (vars.get("request_id"), vars.get("request_id")));
	assert_eq!(first.0, first.1);

	let mut other = Context::new();
	let second = other.run(|| vars.get("request_id"));
	assert_ne!(first.0, second);
}

#[cfg(test)]
mod props {
	use proptest::prelude::*;

	use super::*;
	use crate::scope::ScopeGuard;

	proptest! {
		/// Scopes entered and left in stack order leave the variables as they found them.
		#[test]
		fn prop_nested_scopes_unwind_in_order(depths in proptest::collection::vec(0i64..100, 1..8)) {
			let vars = vars("Nested");
			let mut context = Context::new();
			context.run(|| {
				let before = crate::snapshot::save(&vars);
				let mut guards: Vec<ScopeGuard> = Vec::new();
				for (level, value) in depths.iter().enumerate() {
					let key = if level % 2 == 0 { "user_id" } else { "locale" };
					guards.push(vars.scope([(key, *value)]).expect("declared"));
					prop_assert_eq!(vars.get(key).expect("scoped"), Value::Int(*value));
				}
				while let Some(guard) = guards.pop() {
					drop(guard);
				}
				prop_assert_eq!(crate::snapshot::save(&vars), before);
				Ok(())
			})?;
		}
	}
}
