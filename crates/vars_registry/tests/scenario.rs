use ctxvars_registry::{
	Args, Context, ContextVars, Error, Injector, RawValue, Registry, Value, context_vars, restore, save,
};
use {arc_swap as _, ctxvars_context as _, indexmap as _, parking_lot as _, proptest as _, thiserror as _, tokio as _, tracing as _};

context_vars! {
	/// Per-request settings.
	#[derive(Debug, Clone)]
	pub struct RequestVars {
		locale: String = "en",
		timezone: String = "UTC",
		user_id: Option<i64> = None,
	}
}

context_vars! {
	struct StrictVars: dynamic = false {
		mode: String,
	}
}

#[test]
fn attribute_and_mapping_access() {
	let c = RequestVars::new();
	assert_eq!(c.locale().get().unwrap(), "en");

	let _ = c.timezone().set("GMT".to_string());
	assert_eq!(c.timezone().get().unwrap(), "GMT");

	c.delete("user_id").unwrap();
	assert!(!c.has("user_id"));
	assert_eq!(c.get_or("user_id", "DEFAULT"), Value::from("DEFAULT"));

	let map = c.to_map();
	assert_eq!(
		map.iter().map(|(k, v)| (&**k, v.clone())).collect::<Vec<_>>(),
		[("locale", Value::from("en")), ("timezone", Value::from("GMT"))]
	);

	{
		let _scope = c.scope([("locale", "en_GB")]).unwrap();
		assert_eq!(c.locale().get().unwrap(), "en_GB");
	}
	assert_eq!(c.locale().get().unwrap(), "en");
}

#[test]
fn mapping_size_grows_with_dynamic_slots() {
	let vars = RequestVars::new();
	Context::new().run(|| {
		assert_eq!(vars.len(), 3);
		vars.set("tenant", "acme").unwrap();
		assert_eq!(vars.len(), 4);
		assert!(vars.contains("tenant"));
	});
	assert!(!vars.contains("tenant"));
}

#[test]
fn instances_agree() {
	let a = RequestVars::new();
	let b = RequestVars::default();
	let _ = a.user_id().set(Some(42));
	assert_eq!(b.user_id().get().unwrap(), Some(42));
	assert!(std::sync::Arc::ptr_eq(a.schema(), RequestVars::schema()));
}

#[test]
fn dynamic_allocation_can_be_disabled() {
	let vars = StrictVars::new();
	assert!(matches!(vars.set("other", 1), Err(Error::UndeclaredAttribute { .. })));
	let _ = vars.mode().set("fast".to_string());
	assert_eq!(vars.get("mode").unwrap(), Value::from("fast"));
}

#[test]
fn deleted_slot_reads_as_missing() {
	let vars = RequestVars::new();
	vars.locale().delete();
	let err = vars.locale().get().unwrap_err();
	assert!(err.is_missing());
	assert_eq!(vars.locale().get_or("xx".to_string()), "xx");
}

#[test]
fn save_and_restore() {
	let vars = RequestVars::new();
	let _ = vars.timezone().set("CET".to_string());
	let state1 = save(&vars);

	let _ = vars.timezone().set("PST".to_string());
	vars.set("tenant", "acme").unwrap();
	let state2 = save(&vars);

	restore(&vars, &state1);
	assert_eq!(vars.timezone().get().unwrap(), "CET");
	assert!(!vars.has("tenant"));

	restore(&vars, &state2);
	assert_eq!(vars.timezone().get().unwrap(), "PST");
	assert_eq!(vars.get("tenant").unwrap(), Value::from("acme"));

	vars.locale().delete();
	let state3 = save(&vars);
	assert_eq!(state3.get("locale"), Some(&RawValue::Deleted));
	assert_eq!(state3.get("user_id"), Some(&RawValue::Unset));
}

#[test]
fn schema_from_builder_matches_macro_semantics() {
	use ctxvars_registry::{FieldDecl, Schema};

	let schema = Schema::builder("Manual")
		.field(FieldDecl::new("locale").typed("String").value("en"))
		.field(FieldDecl::new("VERSION").not_context_local().value("1"))
		.build()
		.unwrap();
	let vars = Registry::new(schema);
	assert_eq!(vars.get("locale").unwrap(), Value::from("en"));
	assert_eq!(vars.get("VERSION").unwrap(), Value::from("1"));
	assert_eq!(vars.len(), 1);
}

#[test]
fn injected_arguments_follow_the_current_context() {
	let vars = RequestVars::new();
	let greet = Injector::new().registry(&vars, ["locale", "timezone"]).wrap(|args: Args| {
		format!(
			"{}/{}",
			args.typed::<String>("locale").unwrap(),
			args.typed::<String>("timezone").unwrap()
		)
	});

	assert_eq!(greet(Args::new()), "en/UTC");
	assert_eq!(greet(Args::new().with("locale", "de")), "de/UTC");

	let scoped = vars
		.with_scope([("locale", "nb"), ("timezone", "Europe/Oslo")], || greet(Args::new()))
		.unwrap();
	assert_eq!(scoped, "nb/Europe/Oslo");
	assert_eq!(greet(Args::new()), "en/UTC");
}
