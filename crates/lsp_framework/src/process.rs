use std::time::Duration;

use kestrel_rpc::{Peer, PeerEvent};
use kestrel_worker::{ProcessEvent, ProcessSupervisor, RestartPolicy, SupervisedProcess, TaskClass};
use tokio::process::Command;
use tokio::sync::mpsc;

/// A fresh `Peer`/event-stream pair rewired over a newly spawned incarnation
/// of the supervised process.
pub struct RewiredPeer {
	pub pid: u32,
	pub peer: Peer,
	pub peer_events: mpsc::UnboundedReceiver<PeerEvent>,
}

/// What changed about the supervised child process itself, independent of
/// the RPC peer layered on top of it.
pub enum ProcessLifecycleEvent {
	/// A new incarnation came up; `peer` talks JSON-RPC over its stdio.
	Spawned(RewiredPeer),
	Exited { code: Option<i32> },
	SpawnFailed(String),
	GivenUp,
}

/// Supervises a language server child process, rebuilding a [`Peer`] over its
/// stdio every time the process (re)spawns. Consumers see only
/// [`ProcessLifecycleEvent`]s; they never deal with [`tokio::process::Child`]
/// handles directly, since those are invalidated by a restart.
pub struct ServerProcess {
	supervisor: ProcessSupervisor,
}

impl ServerProcess {
	/// `command_factory` builds the command to launch; it's invoked again on
	/// every restart; `process_name` is used only for log correlation.
	pub fn spawn<F>(process_name: &'static str, policy: RestartPolicy, command_factory: F) -> Self
	where
		F: Fn() -> Command + Send + Sync + 'static,
	{
		let supervisor = ProcessSupervisor::spawn(process_name, TaskClass::Background, policy, command_factory);
		Self { supervisor }
	}

	/// Waits for the next process- or peer-level lifecycle event.
	pub async fn recv(&mut self) -> Option<ProcessLifecycleEvent> {
		let event = self.supervisor.recv().await?;
		Some(match event {
			ProcessEvent::Spawned(process) => ProcessLifecycleEvent::Spawned(Self::rewire(process)),
			ProcessEvent::Exited { code } => ProcessLifecycleEvent::Exited { code },
			ProcessEvent::SpawnFailed(err) => ProcessLifecycleEvent::SpawnFailed(err),
			ProcessEvent::GivenUp => ProcessLifecycleEvent::GivenUp,
		})
	}

	fn rewire(process: SupervisedProcess) -> RewiredPeer {
		let SupervisedProcess { pid, stdin, stdout, stderr } = process;
		if let Some(stderr) = stderr {
			log_stderr(pid, stderr);
		}
		let (peer, peer_events) = Peer::spawn(stdout, stdin);
		RewiredPeer { pid, peer, peer_events }
	}

	pub fn restart_count(&self) -> usize {
		self.supervisor.restart_count()
	}

	pub fn kill(&mut self) {
		self.supervisor.kill();
	}
}

/// Forwards a language server's stderr to the tracing log, line by line, so
/// crash diagnostics aren't silently dropped.
fn log_stderr(pid: u32, stderr: tokio::process::ChildStderr) {
	kestrel_worker::spawn(TaskClass::Background, async move {
		use tokio::io::{AsyncBufReadExt, BufReader};
		let mut lines = BufReader::new(stderr).lines();
		loop {
			match lines.next_line().await {
				Ok(Some(line)) => tracing::debug!(pid, "lsp_framework.server_stderr: {line}"),
				Ok(None) => return,
				Err(err) => {
					tracing::warn!(pid, error = %err, "lsp_framework.server_stderr_read_failed");
					return;
				}
			}
		}
	});
}

/// Default restart policy for a language server: a handful of quick retries,
/// then give up — a server that keeps crashing within a second of launch is
/// almost always a configuration problem, not a transient fault.
pub fn default_restart_policy() -> RestartPolicy {
	RestartPolicy::Always { max_restarts: 3, backoff: Duration::from_millis(500) }
}
