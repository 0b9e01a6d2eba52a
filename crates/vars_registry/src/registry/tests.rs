use ctxvars_context::{Context, RawValue};

use super::*;
use crate::decl::FieldDecl;

fn vars() -> Registry {
	Registry::new(
		Schema::builder("Vars")
			.field(FieldDecl::new("locale").typed("str").value("en"))
			.field(FieldDecl::new("timezone").typed("str").value("UTC"))
			.field(FieldDecl::new("user_id").typed("int"))
			.field(FieldDecl::new("VERSION").not_context_local().value("1.0"))
			.field(FieldDecl::new("render").method())
			.build()
			.unwrap(),
	)
}

#[test]
fn instances_share_state() {
	let a = vars();
	let b = Registry::new(Arc::clone(a.schema()));
	a.set("user_id", 42).unwrap();
	assert_eq!(b.get("user_id").unwrap(), Value::Int(42));
}

#[test]
fn unset_slot_without_default_is_missing() {
	let vars = vars();
	let err = vars.get("user_id").unwrap_err();
	assert!(err.is_missing());
	assert_eq!(err.to_string(), "'Vars' has no attribute 'user_id'");
	assert_eq!(vars.get_or("user_id", -1), Value::Int(-1));
	assert!(!vars.has("user_id"));
}

#[test]
fn unknown_name_is_missing() {
	let vars = vars();
	assert!(matches!(vars.get("nope"), Err(Error::MissingAttribute { .. })));
	assert!(matches!(vars.delete("nope"), Err(Error::MissingAttribute { .. })));
	assert_eq!(vars.get_or("nope", "x"), Value::from("x"));
}

#[test]
fn static_fields_read_but_do_not_write() {
	let vars = vars();
	assert_eq!(vars.get("VERSION").unwrap(), Value::from("1.0"));
	assert!(vars.has("VERSION"));
	assert!(matches!(vars.set("VERSION", "2.0"), Err(Error::ReservedAttribute { .. })));
	assert!(matches!(vars.set("render", 1), Err(Error::ReservedAttribute { .. })));
	assert!(!vars.contains("VERSION"));
}

#[test]
fn mapping_view_tracks_gettable_slots() {
	let vars = vars();
	assert_eq!(vars.len(), 2);
	assert_eq!(vars.keys().iter().map(|k| &**k).collect::<Vec<_>>(), ["locale", "timezone"]);

	vars.set("user_id", 42).unwrap();
	vars.set("request_id", "abc").unwrap();
	assert_eq!(vars.len(), 4);
	assert!(vars.contains("request_id"));

	vars.delete("timezone").unwrap();
	let map = vars.to_map();
	assert_eq!(map.len(), 3);
	assert_eq!(map.keys().map(|k| &**k).collect::<Vec<_>>(), ["locale", "user_id", "request_id"]);
	assert_eq!(vars.values(), [Value::from("en"), Value::Int(42), Value::from("abc")]);
	assert_eq!(vars.items().len(), 3);
}

#[test]
fn update_sets_in_order_and_stops_on_error() {
	let vars = vars();
	let err = vars.update([("locale", "fr"), ("VERSION", "x"), ("timezone", "CET")]).unwrap_err();
	assert!(matches!(err, Error::ReservedAttribute { .. }));
	assert_eq!(vars.get("locale").unwrap(), Value::from("fr"));
	assert_eq!(vars.get("timezone").unwrap(), Value::from("UTC"));
}

#[test]
fn pop_returns_and_deletes() {
	let vars = vars();
	vars.set("user_id", 5).unwrap();
	assert_eq!(vars.pop("user_id").unwrap(), Value::Int(5));
	assert!(!vars.has("user_id"));
	assert!(vars.pop("user_id").unwrap_err().is_missing());
	assert_eq!(vars.pop_or("user_id", 0), Value::Int(0));

	// Defaults are gettable, so they pop too.
	assert_eq!(vars.pop("locale").unwrap(), Value::from("en"));
	assert!(!vars.has("locale"));
}

#[test]
fn set_default_keeps_stored_values() {
	let vars = vars();
	assert_eq!(vars.set_default("user_id", 1).unwrap(), Value::Int(1));
	assert_eq!(vars.set_default("user_id", 2).unwrap(), Value::Int(1));
	// A static default is not a stored value.
	assert_eq!(vars.set_default("locale", "de").unwrap(), Value::from("de"));
}

#[test]
fn clear_deletes_everything_gettable() {
	let vars = vars();
	vars.set("user_id", 1).unwrap();
	vars.clear();
	assert!(vars.is_empty());
	assert_eq!(vars.accessor("user_id").unwrap().load_raw(), RawValue::Deleted);
	assert_eq!(vars.get("VERSION").unwrap(), Value::from("1.0"));
}

#[test]
fn scope_overrides_then_restores() {
	let vars = vars();
	vars.set("user_id", 1).unwrap();
	{
		let guard = vars.scope([("locale", Value::from("nb")), ("user_id", Value::Int(2)), ("trace", true.into())]).unwrap();
		assert_eq!(guard.len(), 3);
		assert_eq!(vars.get("locale").unwrap(), Value::from("nb"));
		assert_eq!(vars.get("user_id").unwrap(), Value::Int(2));
		assert_eq!(vars.get("trace").unwrap(), Value::Bool(true));
	}
	assert_eq!(vars.get("locale").unwrap(), Value::from("en"));
	assert_eq!(vars.get("user_id").unwrap(), Value::Int(1));
	assert!(!vars.has("trace"));
	assert_eq!(vars.accessor("trace").unwrap().load_raw(), RawValue::Unset);
}

#[test]
fn scope_entry_failure_rolls_back() {
	let vars = vars();
	let err = vars.scope([("locale", "fr"), ("VERSION", "2")]).unwrap_err();
	assert!(matches!(err, Error::ReservedAttribute { .. }));
	assert!(!vars.accessor("locale").unwrap().is_set());
}

#[test]
fn with_scope_returns_closure_result() {
	let vars = vars();
	let seen = vars.with_scope([("timezone", "CET")], || vars.get("timezone")).unwrap();
	assert_eq!(seen.unwrap(), Value::from("CET"));
	assert_eq!(vars.get("timezone").unwrap(), Value::from("UTC"));
}

#[test]
fn typed_view() {
	let vars = vars();
	let user_id = vars.typed::<i64>("user_id").unwrap();
	let _ = user_id.set(9);
	assert_eq!(user_id.get().unwrap(), 9);
	assert!(vars.typed::<i64>("missing").is_none());
}

#[test]
fn contexts_see_their_own_values() {
	let vars = vars();
	let mut empty = Context::new();
	vars.set("user_id", 1).unwrap();
	empty.run(|| {
		assert!(!vars.has("user_id"));
		vars.set("user_id", 2).unwrap();
	});
	assert_eq!(vars.get("user_id").unwrap(), Value::Int(1));
}
