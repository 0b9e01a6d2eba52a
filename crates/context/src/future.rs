//! Context propagation for futures.
//!
//! A task that migrates between worker threads cannot rely on any thread's current
//! context. [`WithContext`] owns a [`Context`] and installs it around every poll of
//! the wrapped future, so the future observes the same variables wherever it runs.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use pin_project_lite::pin_project;

use crate::context::Context;
use crate::current;

pin_project! {
	/// Future adapter that runs every poll of `inner` inside an owned context.
	#[must_use = "futures do nothing unless polled"]
	pub struct WithContext<F> {
		#[pin]
		inner: F,
		context: Context,
	}
}

impl<F> WithContext<F> {
	/// Returns the context the future runs in.
	pub fn context(&self) -> &Context {
		&self.context
	}

	/// Consumes the adapter, returning the inner future and its context.
	pub fn into_parts(self) -> (F, Context) {
		(self.inner, self.context)
	}
}

impl<F: Future> Future for WithContext<F> {
	type Output = F::Output;

	fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
		let this = self.project();
		let inner = this.inner;
		this.context.run(|| inner.poll(cx))
	}
}

/// Extension methods attaching a context to any future.
pub trait FutureExt: Future + Sized {
	/// Runs this future inside `context`.
	fn with_context(self, context: Context) -> WithContext<Self> {
		WithContext {
			inner: self,
			context,
		}
	}

	/// Runs this future inside a fork of the caller's current context.
	fn in_current_context(self) -> WithContext<Self> {
		self.with_context(current::fork())
	}
}

impl<F: Future> FutureExt for F {}
