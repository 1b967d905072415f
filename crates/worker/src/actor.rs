//! A minimal supervised-actor pattern: a single task owns some state and
//! processes commands from an mpsc channel one at a time, optionally emitting
//! events to subscribers. If the actor's `handle` returns `Err` (or panics),
//! the supervisor respawns a fresh instance (per [`ActorRestartPolicy`])
//! rather than leaving callers talking to a dead mailbox.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::task::{self, TaskClass};

/// What an actor's command loop should do after handling one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorFlow {
	Continue,
	Stop,
}

/// Side channel an actor uses to emit events to subscribers.
pub struct ActorContext<Evt> {
	events: broadcast::Sender<Evt>,
}

impl<Evt: Clone> ActorContext<Evt> {
	pub fn emit(&self, event: Evt) {
		// No subscribers is the common case; nobody is watching this tick.
		let _ = self.events.send(event);
	}
}

/// Implemented by the state machine an [`ActorRuntime`] drives.
#[async_trait::async_trait]
pub trait Actor: Send + 'static {
	type Cmd: Send + 'static;
	type Evt: Clone + Send + 'static;

	async fn handle(&mut self, cmd: Self::Cmd, ctx: &mut ActorContext<Self::Evt>) -> Result<ActorFlow, String>;
}

/// Restart behavior applied when an actor's `handle` call returns `Err` or panics.
#[derive(Debug, Clone, Copy)]
pub enum ActorRestartPolicy {
	Never,
	OnFailure { max_restarts: usize, backoff: Duration },
}

impl Default for ActorRestartPolicy {
	fn default() -> Self {
		ActorRestartPolicy::OnFailure {
			max_restarts: 3,
			backoff: Duration::from_millis(50),
		}
	}
}

#[derive(Debug, Clone)]
pub struct ActorSupervisorSpec {
	restart: ActorRestartPolicy,
	event_buffer: usize,
}

impl Default for ActorSupervisorSpec {
	fn default() -> Self {
		Self {
			restart: ActorRestartPolicy::default(),
			event_buffer: 64,
		}
	}
}

impl ActorSupervisorSpec {
	pub fn restart(mut self, policy: ActorRestartPolicy) -> Self {
		self.restart = policy;
		self
	}

	pub fn event_buffer(mut self, capacity: usize) -> Self {
		self.event_buffer = capacity.max(1);
		self
	}
}

/// Describes an actor to spawn: its name (for tracing), task class, and a factory
/// that produces a fresh instance — called again on every restart.
pub struct ActorSpec<A: Actor> {
	name: &'static str,
	class: TaskClass,
	factory: Box<dyn Fn() -> A + Send + Sync>,
	supervisor: ActorSupervisorSpec,
}

impl<A: Actor> ActorSpec<A> {
	pub fn new<F>(name: &'static str, class: TaskClass, factory: F) -> Self
	where
		F: Fn() -> A + Send + Sync + 'static,
	{
		Self {
			name,
			class,
			factory: Box::new(factory),
			supervisor: ActorSupervisorSpec::default(),
		}
	}

	pub fn supervisor(mut self, spec: ActorSupervisorSpec) -> Self {
		self.supervisor = spec;
		self
	}
}

enum Envelope<Cmd> {
	Cmd(Cmd),
	Shutdown(ActorShutdownMode, oneshot::Sender<()>),
}

/// Send-only handle to an actor's mailbox.
pub struct ActorCommandPort<Cmd> {
	tx: mpsc::Sender<Envelope<Cmd>>,
}

impl<Cmd> Clone for ActorCommandPort<Cmd> {
	fn clone(&self) -> Self {
		Self { tx: self.tx.clone() }
	}
}

impl<Cmd: Send + 'static> ActorCommandPort<Cmd> {
	pub fn send(&self, cmd: Cmd) -> Result<(), Cmd> {
		match self.tx.try_send(Envelope::Cmd(cmd)) {
			Ok(()) => Ok(()),
			Err(mpsc::error::TrySendError::Full(Envelope::Cmd(cmd))) => Err(cmd),
			Err(mpsc::error::TrySendError::Closed(Envelope::Cmd(cmd))) => Err(cmd),
			_ => unreachable!("only Cmd envelopes are sent through try_send"),
		}
	}
}

/// How to wind an actor down: let it drain its mailbox, or cut it off immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorShutdownMode {
	Graceful,
	Immediate,
}

#[derive(Debug, Clone, Default)]
pub struct ActorShutdownReport {
	pub restarts: usize,
}

/// Owns the running task for an actor, including its restart count, so that
/// a caller can observe supervisor health and request shutdown.
pub struct ActorRuntime<A: Actor> {
	port: ActorCommandPort<A::Cmd>,
	events: broadcast::Sender<A::Evt>,
	restart_count: Arc<AtomicUsize>,
}

impl<A: Actor> fmt::Debug for ActorRuntime<A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ActorRuntime").field("restart_count", &self.restart_count.load(Ordering::Relaxed)).finish()
	}
}

impl<A: Actor> ActorRuntime<A> {
	pub fn spawn(spec: ActorSpec<A>) -> Self {
		let (tx, mut rx) = mpsc::channel::<Envelope<A::Cmd>>(4096);
		let (events_tx, _events_rx) = broadcast::channel(spec.supervisor.event_buffer.max(1));
		let restart_count = Arc::new(AtomicUsize::new(0));

		let restart_count_task = restart_count.clone();
		let events_tx_task = events_tx.clone();
		let name = spec.name;
		let factory = spec.factory;
		let restart_policy = spec.supervisor.restart;

		task::spawn(spec.class, async move {
			let mut actor = factory();
			let mut ctx = ActorContext { events: events_tx_task };
			let mut restarts = 0usize;

			loop {
				let Some(envelope) = rx.recv().await else {
					break;
				};

				match envelope {
					Envelope::Shutdown(mode, done) => {
						if mode == ActorShutdownMode::Graceful {
							while let Ok(envelope) = rx.try_recv() {
								if let Envelope::Cmd(cmd) = envelope {
									let _ = actor.handle(cmd, &mut ctx).await;
								}
							}
						}
						let _ = done.send(());
						break;
					}
					Envelope::Cmd(cmd) => {
						let outcome = AssertUnwindSafe(actor.handle(cmd, &mut ctx)).catch_unwind().await;
						let flow = match outcome {
							Ok(Ok(flow)) => flow,
							other => {
								let reason = match other {
									Ok(Err(reason)) => reason,
									_ => "actor panicked".to_string(),
								};
								tracing::warn!(actor = name, error = %reason, "worker.actor.failed");
								match restart_policy {
									ActorRestartPolicy::Never => break,
									ActorRestartPolicy::OnFailure { max_restarts, backoff } => {
										if restarts >= max_restarts {
											tracing::error!(actor = name, restarts, "worker.actor.restart_limit_exceeded");
											break;
										}
										restarts += 1;
										restart_count_task.fetch_add(1, Ordering::Relaxed);
										tokio::time::sleep(backoff).await;
										actor = factory();
										ActorFlow::Continue
									}
								}
							}
						};
						if flow == ActorFlow::Stop {
							break;
						}
					}
				}
			}
		});

		Self {
			port: ActorCommandPort { tx },
			events: events_tx,
			restart_count,
		}
	}

	pub fn port(&self) -> ActorCommandPort<A::Cmd> {
		self.port.clone()
	}

	pub fn subscribe(&self) -> broadcast::Receiver<A::Evt> {
		self.events.subscribe()
	}

	pub fn restart_count(&self) -> usize {
		self.restart_count.load(Ordering::Relaxed)
	}

	pub async fn shutdown(&self, mode: ActorShutdownMode) -> ActorShutdownReport {
		let (done_tx, done_rx) = oneshot::channel();
		if self.port.tx.send(Envelope::Shutdown(mode, done_tx)).await.is_ok() {
			let _ = done_rx.await;
		}
		ActorShutdownReport {
			restarts: self.restart_count(),
		}
	}
}

use std::panic::AssertUnwindSafe;

/// Convenience wrapper bundling a running [`ActorRuntime`] with its command port,
/// for callers that only ever send commands, watch restarts, and request shutdown.
/// `actor` must be [`Clone`] so the supervisor can produce a fresh instance on restart.
pub struct ActorCommandIngress<A: Actor> {
	runtime: ActorRuntime<A>,
}

impl<A: Actor + Clone> ActorCommandIngress<A> {
	pub fn with_capacity(class: TaskClass, actor: A, capacity: usize) -> Self {
		let spec = ActorSpec::new("actor", class, move || actor.clone()).supervisor(ActorSupervisorSpec::default().event_buffer(capacity));
		Self { runtime: ActorRuntime::spawn(spec) }
	}

	pub fn port(&self) -> ActorCommandPort<A::Cmd> {
		self.runtime.port()
	}

	pub fn send(&self, cmd: A::Cmd) -> Result<(), A::Cmd> {
		self.runtime.port().send(cmd)
	}

	pub fn actor(&self) -> &ActorRuntime<A> {
		&self.runtime
	}

	pub async fn shutdown(&self, mode: ActorShutdownMode) -> ActorShutdownReport {
		self.runtime.shutdown(mode).await
	}
}
