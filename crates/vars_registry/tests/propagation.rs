use ctxvars_registry::context::{FutureExt, current, spawn_thread, with_empty, with_sandbox};
use ctxvars_registry::{Value, context_vars};
use {arc_swap as _, ctxvars_context as _, indexmap as _, parking_lot as _, proptest as _, thiserror as _, tracing as _};

context_vars! {
	struct Vars {
		timezone: String = "UTC",
		request_id: i64,
	}
}

#[test]
fn forked_context_is_isolated() {
	let vars = Vars::new();
	let _ = vars.timezone().set("GMT".to_string());

	let mut b = current::fork();
	b.run(|| {
		assert_eq!(vars.timezone().get().unwrap(), "GMT");
		let _ = vars.timezone().set("UTC".to_string());
	});

	assert_eq!(vars.timezone().get().unwrap(), "GMT");
	b.run(|| assert_eq!(vars.timezone().get().unwrap(), "UTC"));
}

#[test]
fn spawned_threads_inherit_a_snapshot() {
	let vars = Vars::new();
	let _ = vars.request_id().set(7);

	let seen = spawn_thread(|| {
		let vars = Vars::new();
		let before = vars.request_id().get().unwrap();
		let _ = vars.request_id().set(8);
		before
	})
	.join()
	.unwrap();

	assert_eq!(seen, 7);
	assert_eq!(vars.request_id().get().unwrap(), 7);
}

#[test]
fn plain_threads_start_empty() {
	let vars = Vars::new();
	let _ = vars.request_id().set(1);
	let seen = std::thread::spawn(|| Vars::new().request_id().is_set()).join().unwrap();
	assert!(!seen);
}

#[test]
fn bound_closures() {
	let vars = Vars::new();
	let _ = vars.request_id().set(3);

	let mut empty = with_empty(|| Vars::new().has("request_id"));
	assert!(!empty());

	let mut sandboxed = with_sandbox(|| {
		let vars = Vars::new();
		vars.set("request_id", 4).unwrap();
		vars.get("request_id").unwrap()
	});
	assert_eq!(sandboxed(), Value::Int(4));
	assert_eq!(vars.get("request_id").unwrap(), Value::Int(3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn futures_carry_their_context() {
	let vars = Vars::new();
	let _ = vars.request_id().set(11);

	let task = async {
		tokio::task::yield_now().await;
		Vars::new().request_id().get().unwrap()
	};
	let handle = tokio::spawn(task.in_current_context());
	assert_eq!(handle.await.unwrap(), 11);
}
