use crate::current;

/// Spawns an OS thread whose current context is a fork of the caller's.
pub fn spawn_thread<F, R>(f: F) -> std::thread::JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	let mut ctx = current::fork();
	tracing::trace!(domain = "context", context = ctx.id().as_u64(), "context.spawn_thread");
	std::thread::spawn(move || ctx.run(f))
}

/// Spawns a named OS thread whose current context is a fork of the caller's.
pub fn spawn_named_thread<F, R>(
	name: impl Into<String>,
	f: F,
) -> std::io::Result<std::thread::JoinHandle<R>>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	let mut ctx = current::fork();
	tracing::trace!(domain = "context", context = ctx.id().as_u64(), "context.spawn_named_thread");
	std::thread::Builder::new()
		.name(name.into())
		.spawn(move || ctx.run(f))
}

/// Spawns a task on the current tokio runtime, carrying a fork of the caller's context.
///
/// # Panics
///
/// Panics when called outside a tokio runtime, like [`tokio::spawn`].
#[cfg(feature = "tokio")]
pub fn spawn<F>(fut: F) -> tokio::task::JoinHandle<F::Output>
where
	F: std::future::Future + Send + 'static,
	F::Output: Send + 'static,
{
	use crate::future::FutureExt;

	let fut = fut.in_current_context();
	tracing::trace!(domain = "context", context = fut.context().id().as_u64(), "context.spawn");
	tokio::spawn(fut)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::CellId;
	use crate::value::{RawValue, Value};

	#[test]
	fn thread_inherits_fork() {
		let cell = CellId::next();
		let _ = current::store(cell, RawValue::Present(Value::from("nb")));

		let seen = spawn_thread(move || {
			let seen = current::load(cell);
			let _ = current::store(cell, RawValue::Deleted);
			seen
		})
		.join()
		.unwrap();

		assert_eq!(seen, Some(RawValue::Present(Value::from("nb"))));
		assert_eq!(current::load(cell), Some(RawValue::Present(Value::from("nb"))));
	}

	#[test]
	fn plain_thread_starts_empty() {
		let cell = CellId::next();
		let _ = current::store(cell, RawValue::Present(Value::Int(1)));
		let seen = std::thread::spawn(move || current::load(cell)).join().unwrap();
		assert!(seen.is_none());
	}

	#[test]
	fn named_thread_keeps_name() {
		let handle = spawn_named_thread("ctx-worker", || {
			std::thread::current().name().map(str::to_string)
		})
		.unwrap();
		assert_eq!(handle.join().unwrap().as_deref(), Some("ctx-worker"));
	}
}
