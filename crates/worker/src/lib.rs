//! Shared worker runtime primitives and task orchestration.
//!
//! Two layers live here: a thin [`spawn`]/[`spawn_blocking`] wrapper that tags every
//! task with a [`TaskClass`] for observability, and a small actor runtime
//! ([`Actor`], [`ActorRuntime`], [`ActorCommandIngress`]) used by longer-lived
//! owners of external resources — most relevantly [`supervisor::ProcessSupervisor`],
//! which restarts a crashed child process with backoff.

mod actor;
mod supervisor;
mod task;

pub use actor::{
	Actor, ActorCommandIngress, ActorCommandPort, ActorContext, ActorFlow, ActorRestartPolicy, ActorRuntime, ActorShutdownMode, ActorShutdownReport,
	ActorSpec, ActorSupervisorSpec,
};
pub use supervisor::{send_signal, ProcessEvent, ProcessSupervisor, RestartPolicy, SupervisedProcess};
pub use task::{spawn, spawn_blocking, TaskClass};
