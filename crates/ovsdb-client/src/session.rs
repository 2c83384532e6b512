//! OVSDB session: one connection, one dispatch task
//!
//! The dispatch task owns the read half of the stream. It completes
//! outstanding calls by request id, answers the server's `echo` requests
//! and routes `update`/`locked`/`stolen` notifications through the
//! [`SessionRegistry`] to the handler of this session. A writer task owns
//! the write half and takes whole frames from a queue, so a caller that
//! gives up on a call never leaves half a frame on the stream.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::{debug, error, info, warn};

use ovsdb_core::{DatabaseSchema, Error, Result};

use crate::codec::{write_frame, FrameReader};
use crate::config::{Address, ClientConfig};
use crate::notification::{NoopHandler, Notification, NotificationHandler};
use crate::protocol::{parse_message, Message, Request, Response};
use crate::registry::{handler_slot, ConnectionId, HandlerSlot, SessionRegistry};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closed,
}

const OUTBOUND_QUEUE: usize = 64;

type Reply = oneshot::Sender<Result<Value>>;

enum Outbound {
    Frame(Value),
    /// Flush and shut down the write half, then acknowledge
    Shutdown(oneshot::Sender<()>),
}

struct Calls {
    state: SessionState,
    pending: HashMap<u64, Reply>,
}

pub(crate) struct Shared {
    connection: ConnectionId,
    registry: SessionRegistry,
    handler: HandlerSlot,
    outbound: mpsc::Sender<Outbound>,
    calls: Mutex<Calls>,
    next_id: AtomicU64,
    shutdown: Notify,
    pub(crate) schemas: RwLock<HashMap<String, Arc<DatabaseSchema>>>,
}

impl Shared {
    fn lock_calls(&self) -> MutexGuard<'_, Calls> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> SessionState {
        self.lock_calls().state
    }

    async fn send(&self, frame: Value) -> Result<()> {
        self.outbound
            .send(Outbound::Frame(frame))
            .await
            .map_err(|_| Error::ConnectionClosed)
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = serde_json::to_value(Request::new(method, params, id))?;

        let (tx, rx) = oneshot::channel();
        {
            let mut calls = self.lock_calls();
            if calls.state == SessionState::Closed {
                return Err(Error::ConnectionClosed);
            }
            calls.pending.insert(id, tx);
        }
        let _pending = PendingCall { shared: self, id };

        debug!("{} -> {}", self.connection, frame);
        self.send(frame).await?;

        rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Move to Closed, deregister, then fail every outstanding call.
    /// Only the first invocation has any effect.
    fn teardown(&self) {
        let pending = {
            let mut calls = self.lock_calls();
            if calls.state == SessionState::Closed {
                return;
            }
            calls.state = SessionState::Closed;
            std::mem::take(&mut calls.pending)
        };

        self.registry.deregister(self.connection);

        let outstanding = pending.len();
        for (_, reply) in pending {
            let _ = reply.send(Err(Error::ConnectionClosed));
        }
        info!(
            "OVSDB session {} closed ({} outstanding calls failed)",
            self.connection, outstanding
        );
    }

    fn complete(&self, response: Response) {
        let Some(id) = response.id.as_u64() else {
            warn!("Response with unexpected id {} on {}", response.id, self.connection);
            return;
        };
        let reply = self.lock_calls().pending.remove(&id);
        match reply {
            Some(reply) => {
                let _ = reply.send(response.into_result());
            }
            None => warn!("Response to unknown request {} on {}", id, self.connection),
        }
    }

    async fn handle_request(&self, request: Request) {
        if request.method == "echo" {
            if request.is_notification() {
                return;
            }
            let reply = Response::success(request.id, request.params);
            self.send_response(reply).await;
            return;
        }

        match Notification::parse(&request.method, &request.params) {
            Ok(Some(notification)) => {
                if !self.registry.dispatch(self.connection, &notification) {
                    debug!(
                        "Dropping {} notification for deregistered {}",
                        notification.method(),
                        self.connection
                    );
                }
            }
            Ok(None) => {
                warn!("Unknown method {:?} from server on {}", request.method, self.connection);
                if !request.is_notification() {
                    let reply = Response::error(request.id, format!("unknown method: {}", request.method));
                    self.send_response(reply).await;
                }
            }
            Err(e) => warn!("Malformed {} notification on {}: {}", request.method, self.connection, e),
        }
    }

    async fn send_response(&self, response: Response) {
        let frame = match serde_json::to_value(&response) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to encode response: {}", e);
                return;
            }
        };
        debug!("{} -> {}", self.connection, frame);
        if let Err(e) = self.send(frame).await {
            warn!("Failed to send response on {}: {}", self.connection, e);
        }
    }

    async fn shutdown_writer(&self) {
        let (done, acked) = oneshot::channel();
        if self.outbound.send(Outbound::Shutdown(done)).await.is_ok() {
            let _ = acked.await;
        }
    }
}

/// Drops the reply slot of a call, whether it completed or was abandoned
struct PendingCall<'a> {
    shared: &'a Shared,
    id: u64,
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        self.shared.lock_calls().pending.remove(&self.id);
    }
}

async fn writer_loop<W>(shared: Weak<Shared>, mut outbound: mpsc::Receiver<Outbound>, mut writer: W)
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbound.recv().await {
        match message {
            Outbound::Frame(frame) => {
                if let Err(e) = write_frame(&mut writer, &frame).await {
                    if let Some(shared) = shared.upgrade() {
                        error!("Writing to {} failed: {}", shared.connection, e);
                        shared.teardown();
                        shared.shutdown.notify_one();
                    }
                    break;
                }
            }
            Outbound::Shutdown(done) => {
                if let Err(e) = writer.shutdown().await {
                    debug!("Shutting down write half failed: {}", e);
                }
                let _ = done.send(());
                break;
            }
        }
    }
}

async fn dispatch_loop<R>(shared: Arc<Shared>, mut reader: FrameReader<R>)
where
    R: AsyncRead + Unpin,
{
    loop {
        let frame = tokio::select! {
            _ = shared.shutdown.notified() => break,
            frame = reader.next_frame() => frame,
        };
        let frame = match frame {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("OVSDB server closed connection {}", shared.connection);
                break;
            }
            Err(e) => {
                error!("Reading from {} failed: {}", shared.connection, e);
                break;
            }
        };
        debug!("{} <- {}", shared.connection, frame);

        match parse_message(frame) {
            Ok(Message::Response(response)) => shared.complete(response),
            Ok(Message::Request(request)) => shared.handle_request(request).await,
            Err(e) => warn!("Ignoring malformed message on {}: {}", shared.connection, e),
        }
    }
    shared.teardown();
}

fn spawn_keepalive(shared: Weak<Shared>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(shared) = shared.upgrade() else {
                break;
            };
            if shared.state() != SessionState::Open {
                break;
            }
            match shared.call("echo", json!([])).await {
                Ok(_) => debug!("Keepalive echo answered on {}", shared.connection),
                Err(e) if e.is_fatal() => break,
                Err(e) => warn!("Keepalive echo failed on {}: {}", shared.connection, e),
            }
        }
    });
}

/// Tears the session down when the last [`Session`] handle goes away
struct Owner {
    shared: Arc<Shared>,
}

impl Drop for Owner {
    fn drop(&mut self) {
        self.shared.teardown();
        self.shared.shutdown.notify_one();
    }
}

/// A client session with one OVSDB server.
///
/// Cheap to clone; every clone drives the same connection. The session is
/// closed when [`close`](Session::close) is called, when the server closes
/// the stream, or when the last handle is dropped.
#[derive(Clone)]
pub struct Session {
    owner: Arc<Owner>,
}

impl Session {
    /// Dial the configured address with a private registry
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        Self::connect_with_registry(config, SessionRegistry::new()).await
    }

    /// Dial the configured address and register the session in `registry`
    pub async fn connect_with_registry(config: &ClientConfig, registry: SessionRegistry) -> Result<Self> {
        info!("Connecting to OVSDB at {}", config.address);
        let session = match &config.address {
            Address::Tcp(addr) => {
                let stream = TcpStream::connect(addr.as_str())
                    .await
                    .map_err(|e| Error::connection(format!("failed to connect to {}: {}", config.address, e)))?;
                Self::from_stream_with_registry(stream, registry)
            }
            Address::Unix(path) => {
                let stream = UnixStream::connect(path)
                    .await
                    .map_err(|e| Error::connection(format!("failed to connect to {}: {}", config.address, e)))?;
                Self::from_stream_with_registry(stream, registry)
            }
        };
        if let Some(interval) = config.keepalive {
            session.start_keepalive(interval);
        }
        Ok(session)
    }

    /// Run a session over an established stream. Must be called within a
    /// tokio runtime.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::from_stream_with_registry(stream, SessionRegistry::new())
    }

    pub fn from_stream_with_registry<S>(stream: S, registry: SessionRegistry) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let handler = handler_slot(Arc::new(NoopHandler));
        let connection = registry.register(Arc::clone(&handler));
        let (outbound, queue) = mpsc::channel(OUTBOUND_QUEUE);

        let shared = Arc::new(Shared {
            connection,
            registry,
            handler,
            outbound,
            calls: Mutex::new(Calls {
                state: SessionState::Connecting,
                pending: HashMap::new(),
            }),
            next_id: AtomicU64::new(0),
            shutdown: Notify::new(),
            schemas: RwLock::new(HashMap::new()),
        });
        shared.lock_calls().state = SessionState::Open;
        info!("OVSDB session {} open", connection);

        tokio::spawn(writer_loop(Arc::downgrade(&shared), queue, writer));
        tokio::spawn(dispatch_loop(Arc::clone(&shared), FrameReader::new(reader)));

        Self {
            owner: Arc::new(Owner { shared }),
        }
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.owner.shared
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.shared().connection
    }

    pub fn state(&self) -> SessionState {
        self.shared().state()
    }

    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Send an `echo` every `interval` while the session is open. A zero
    /// interval is ignored.
    pub fn start_keepalive(&self, interval: Duration) {
        if interval.is_zero() {
            return;
        }
        spawn_keepalive(Arc::downgrade(self.shared()), interval);
    }

    /// Replace the notification handler. A notification being delivered
    /// while the handler is swapped may reach either handler.
    pub fn set_notification_handler(&self, handler: Arc<dyn NotificationHandler>) {
        *self
            .shared()
            .handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = handler;
    }

    /// Send a request and wait for its reply.
    ///
    /// There is no timeout: the call only fails early if the connection
    /// closes, with [`Error::ConnectionClosed`].
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.shared().call(method, params).await
    }

    /// [`call`](Session::call), decoding the result as `T`
    pub async fn call_typed<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result)
            .map_err(|e| Error::protocol(format!("unexpected {} reply: {}", method, e)))
    }

    /// Close the connection. Outstanding calls fail with
    /// [`Error::ConnectionClosed`] before this returns.
    pub async fn close(&self) {
        let shared = self.shared();
        shared.teardown();
        shared.shutdown.notify_one();
        shared.shutdown_writer().await;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("connection", &self.connection_id())
            .field("state", &self.state())
            .finish()
    }
}
