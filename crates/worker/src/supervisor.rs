//! Generic, LSP-agnostic child-process supervision: spawn a command, watch it
//! exit, and respawn with backoff. Used by `kestrel-lsp-framework`'s
//! `client-monitor` feature to keep a language server process alive across
//! crashes without the framework itself knowing anything about process
//! lifecycles.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;

use crate::task::{self, TaskClass};

/// Backoff applied between restart attempts after the supervised process exits.
#[derive(Debug, Clone, Copy)]
pub enum RestartPolicy {
	/// Never restart; report the exit and stop.
	Never,
	/// Restart up to `max_restarts` times, waiting `backoff` between attempts.
	Always { max_restarts: usize, backoff: Duration },
}

impl Default for RestartPolicy {
	fn default() -> Self {
		RestartPolicy::Always {
			max_restarts: 5,
			backoff: Duration::from_millis(500),
		}
	}
}

/// The piped stdio handles for one incarnation of the supervised process.
pub struct SupervisedProcess {
	pub pid: u32,
	pub stdin: ChildStdin,
	pub stdout: ChildStdout,
	pub stderr: Option<ChildStderr>,
}

/// Lifecycle events emitted as the supervised process is spawned, exits, and
/// (if the policy allows) respawns.
pub enum ProcessEvent {
	/// A new incarnation came up; its stdio handles are attached here because
	/// they change on every restart and the old ones are no longer valid.
	Spawned(SupervisedProcess),
	/// The current incarnation exited. `code` is `None` if it was killed by a signal.
	Exited { code: Option<i32> },
	/// Spawning the next incarnation failed outright (e.g. binary not found).
	SpawnFailed(String),
	/// The restart budget was exhausted; no further incarnations will be spawned.
	GivenUp,
}

/// Owns the supervised process's lifecycle task. Drop (or [`ProcessSupervisor::kill`])
/// to terminate the current incarnation and stop restarting.
pub struct ProcessSupervisor {
	events: mpsc::UnboundedReceiver<ProcessEvent>,
	restart_count: std::sync::Arc<std::sync::atomic::AtomicUsize>,
	shutdown: Option<tokio_util::sync::CancellationToken>,
}

impl ProcessSupervisor {
	/// Spawns the first incarnation via `command_factory` and starts supervising it.
	/// `command_factory` is called again for every restart, so it must build an
	/// equivalent, freshly-configured [`Command`] each time.
	pub fn spawn<F>(name: &'static str, class: TaskClass, policy: RestartPolicy, command_factory: F) -> Self
	where
		F: Fn() -> Command + Send + Sync + 'static,
	{
		let (tx, rx) = mpsc::unbounded_channel();
		let restart_count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
		let restart_count_task = restart_count.clone();
		let shutdown = tokio_util::sync::CancellationToken::new();
		let shutdown_task = shutdown.clone();

		task::spawn(class, async move {
			let mut attempt = 0usize;

			loop {
				let mut command = command_factory();
				command.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);

				let mut child = match command.spawn() {
					Ok(child) => child,
					Err(err) => {
						tracing::warn!(process = name, error = %err, "worker.supervisor.spawn_failed");
						if tx.send(ProcessEvent::SpawnFailed(err.to_string())).is_err() {
							return;
						}
						if !Self::should_retry(policy, attempt) {
							let _ = tx.send(ProcessEvent::GivenUp);
							return;
						}
						attempt += 1;
						restart_count_task.store(attempt, std::sync::atomic::Ordering::Relaxed);
						if let RestartPolicy::Always { backoff, .. } = policy {
							tokio::time::sleep(backoff).await;
						}
						continue;
					}
				};

				let pid = child.id().unwrap_or_default();
				let Some(process) = Self::take_stdio(pid, &mut child) else {
					tracing::error!(process = name, "worker.supervisor.missing_stdio");
					return;
				};
				if tx.send(ProcessEvent::Spawned(process)).is_err() {
					return;
				}

				let exit = tokio::select! {
					status = child.wait() => status,
					_ = shutdown_task.cancelled() => {
						let _ = child.start_kill();
						return;
					}
				};

				let code = match exit {
					Ok(status) => status.code(),
					Err(err) => {
						tracing::warn!(process = name, error = %err, "worker.supervisor.wait_failed");
						None
					}
				};
				tracing::info!(process = name, ?code, "worker.supervisor.exited");
				if tx.send(ProcessEvent::Exited { code }).is_err() {
					return;
				}

				if !Self::should_retry(policy, attempt) {
					let _ = tx.send(ProcessEvent::GivenUp);
					return;
				}
				attempt += 1;
				restart_count_task.store(attempt, std::sync::atomic::Ordering::Relaxed);
				if let RestartPolicy::Always { backoff, .. } = policy {
					tokio::time::sleep(backoff).await;
				}
			}
		});

		Self {
			events: rx,
			restart_count,
			shutdown: Some(shutdown),
		}
	}

	fn should_retry(policy: RestartPolicy, attempt: usize) -> bool {
		match policy {
			RestartPolicy::Never => false,
			RestartPolicy::Always { max_restarts, .. } => attempt < max_restarts,
		}
	}

	fn take_stdio(pid: u32, child: &mut Child) -> Option<SupervisedProcess> {
		Some(SupervisedProcess {
			pid,
			stdin: child.stdin.take()?,
			stdout: child.stdout.take()?,
			stderr: child.stderr.take(),
		})
	}

	/// Receives the next lifecycle event, or `None` once the supervisor task has ended.
	pub async fn recv(&mut self) -> Option<ProcessEvent> {
		self.events.recv().await
	}

	/// Number of restarts performed so far.
	pub fn restart_count(&self) -> usize {
		self.restart_count.load(std::sync::atomic::Ordering::Relaxed)
	}

	/// Terminates the current incarnation and stops restarting.
	pub fn kill(&mut self) {
		if let Some(token) = self.shutdown.take() {
			token.cancel();
		}
	}
}

/// Sends `signal` to `pid` using the platform's native signal delivery.
///
/// Used for graceful-shutdown attempts (e.g. SIGTERM) before falling back to
/// [`ProcessSupervisor::kill`], which is a hard kill.
#[cfg(unix)]
pub fn send_signal(pid: u32, signal: rustix::process::Signal) -> io::Result<()> {
	let pid = rustix::process::Pid::from_raw(pid as i32).ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "pid 0 is not a valid target"))?;
	rustix::process::kill_process(pid, signal).map_err(io::Error::from)
}

#[cfg(not(unix))]
pub fn send_signal(_pid: u32, _signal: ()) -> io::Result<()> {
	Err(io::Error::new(io::ErrorKind::Unsupported, "signal delivery is unix-only"))
}
