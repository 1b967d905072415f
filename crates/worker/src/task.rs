use std::future::Future;

use tokio::task::JoinHandle;

/// Coarse classification of a spawned task, attached to its tracing span so that
/// slow or runaway tasks can be attributed to a subsystem at a glance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Long-running background work with no particular deadline.
	Background,
	/// A blocking, CPU-bound computation that must not run on the async scheduler.
	CpuBlocking,
	/// Work performed on behalf of an interactive request; expected to finish quickly.
	Interactive,
}

impl TaskClass {
	fn label(self) -> &'static str {
		match self {
			TaskClass::Background => "background",
			TaskClass::CpuBlocking => "cpu_blocking",
			TaskClass::Interactive => "interactive",
		}
	}
}

/// Spawns `fut` on the current Tokio runtime, recording its [`TaskClass`] in the span.
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	let span = tracing::debug_span!("worker.task", class = class.label());
	tokio::spawn(tracing::Instrument::instrument(fut, span))
}

/// Runs `f` on the blocking thread pool, recording its [`TaskClass`] in the span.
pub fn spawn_blocking<F, R>(class: TaskClass, f: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	let _span = tracing::debug_span!("worker.blocking_task", class = class.label()).entered();
	tokio::task::spawn_blocking(f)
}
