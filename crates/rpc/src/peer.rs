use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use kestrel_worker::TaskClass;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::{mpsc, oneshot};

use crate::codec::{read_message, write_message};
use crate::error::{Error, Result};
use crate::message::{AnyNotification, AnyRequest, AnyResponse, JsonValue, Message, RequestId, ResponseError};

/// Something arriving from the remote peer that the caller (the LSP client
/// layer) must react to: a server-initiated request or notification.
/// Responses to our own outgoing requests are resolved internally and never
/// surface here.
pub enum PeerEvent {
	Request(AnyRequest),
	Notification(AnyNotification),
	/// The read side of the transport closed; no further events will arrive.
	Closed,
}

type PendingMap = Arc<Mutex<HashMap<RequestId, oneshot::Sender<std::result::Result<JsonValue, ResponseError>>>>>;

/// A correlating JSON-RPC peer: owns the write half of a transport directly,
/// and drives a background task over the read half that demultiplexes
/// responses (resolving pending [`Peer::call`] futures) from inbound
/// requests/notifications (forwarded as [`PeerEvent`]s).
#[derive(Clone)]
pub struct Peer {
	writer: Arc<tokio::sync::Mutex<Box<dyn AsyncWriteHalf>>>,
	pending: PendingMap,
	next_id: Arc<AtomicI64>,
}

/// Object-safe wrapper so `Peer` doesn't need to be generic over its writer type.
trait AsyncWriteHalf: Send {
	fn write_value<'a>(&'a mut self, value: &'a JsonValue) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>>;
}

/// Drops every still-pending call's sender once the read loop observes the
/// stream closing, so `Peer::call` futures resolve with [`Error::Closed`]
/// immediately instead of waiting on a response that can now never arrive.
fn drain_pending(pending: &PendingMap) {
	pending.lock().expect("rpc pending map poisoned").clear();
}

struct WriteHalf<W>(W);

impl<W: AsyncWrite + Unpin + Send> AsyncWriteHalf for WriteHalf<W> {
	fn write_value<'a>(&'a mut self, value: &'a JsonValue) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
		Box::pin(write_message(&mut self.0, value))
	}
}

impl Peer {
	/// Spawns the read-loop task and returns the peer handle alongside the
	/// channel of inbound requests/notifications.
	pub fn spawn<R, W>(reader: R, writer: W) -> (Self, mpsc::UnboundedReceiver<PeerEvent>)
	where
		R: AsyncRead + Unpin + Send + 'static,
		W: AsyncWrite + Unpin + Send + 'static,
	{
		let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
		let (events_tx, events_rx) = mpsc::unbounded_channel();

		let pending_task = pending.clone();
		kestrel_worker::spawn(TaskClass::Background, async move {
			let mut reader = BufReader::new(reader);
			loop {
				match read_message(&mut reader).await {
					Ok(Some(value)) => match Message::from_json_value(value) {
						Ok(Message::Response(response)) => {
							let AnyResponse { id, result, error } = response;
							if let Some(tx) = pending_task.lock().expect("rpc pending map poisoned").remove(&id) {
								let outcome = match error {
									Some(err) => Err(err),
									None => Ok(result.unwrap_or(JsonValue::Null)),
								};
								let _ = tx.send(outcome);
							} else {
								tracing::debug!(?id, "rpc.peer.unmatched_response");
							}
						}
						Ok(Message::Request(request)) => {
							if events_tx.send(PeerEvent::Request(request)).is_err() {
								return;
							}
						}
						Ok(Message::Notification(notification)) => {
							if events_tx.send(PeerEvent::Notification(notification)).is_err() {
								return;
							}
						}
						Err(err) => tracing::warn!(error = %err, "rpc.peer.malformed_message"),
					},
					Ok(None) => {
						drain_pending(&pending_task);
						let _ = events_tx.send(PeerEvent::Closed);
						return;
					}
					Err(err) => {
						tracing::warn!(error = %err, "rpc.peer.read_failed");
						drain_pending(&pending_task);
						let _ = events_tx.send(PeerEvent::Closed);
						return;
					}
				}
			}
		});

		let peer = Self {
			writer: Arc::new(tokio::sync::Mutex::new(Box::new(WriteHalf(writer)))),
			pending,
			next_id: Arc::new(AtomicI64::new(1)),
		};
		(peer, events_rx)
	}

	/// Sends a request and awaits its matching response.
	pub async fn call(&self, method: impl Into<String>, params: Option<JsonValue>) -> Result<JsonValue> {
		let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed));
		let (tx, rx) = oneshot::channel();
		self.pending.lock().expect("rpc pending map poisoned").insert(id.clone(), tx);

		let request = AnyRequest { id: id.clone(), method: method.into(), params };
		if let Err(err) = self.send(Message::Request(request)).await {
			self.pending.lock().expect("rpc pending map poisoned").remove(&id);
			return Err(err);
		}

		match rx.await {
			Ok(Ok(value)) => Ok(value),
			Ok(Err(remote)) => Err(Error::Remote(remote)),
			Err(_) => Err(Error::Closed),
		}
	}

	/// Sends a fire-and-forget notification.
	pub async fn notify(&self, method: impl Into<String>, params: Option<JsonValue>) -> Result<()> {
		self.send(Message::Notification(AnyNotification { method: method.into(), params })).await
	}

	/// Sends a response to a request the peer sent us.
	pub async fn respond(&self, id: RequestId, result: std::result::Result<JsonValue, ResponseError>) -> Result<()> {
		let (result, error) = match result {
			Ok(value) => (Some(value), None),
			Err(err) => (None, Some(err)),
		};
		self.send(Message::Response(AnyResponse { id, result, error })).await
	}

	async fn send(&self, message: Message) -> Result<()> {
		let value = message.to_json_value();
		let mut writer = self.writer.lock().await;
		writer.write_value(&value).await
	}
}

/// Drives outgoing requests through `tower`, so LSP-layer middleware (rate
/// limiting, request logging, timeouts via `tower::timeout::Timeout`) can wrap
/// a `Peer` the same way it would wrap any other service.
impl tower_service::Service<AnyRequest> for Peer {
	type Response = JsonValue;
	type Error = Error;
	type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<JsonValue>> + Send>>;

	fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<()>> {
		std::task::Poll::Ready(Ok(()))
	}

	fn call(&mut self, request: AnyRequest) -> Self::Future {
		let peer = self.clone();
		Box::pin(async move { peer.call(request.method, request.params).await })
	}
}
