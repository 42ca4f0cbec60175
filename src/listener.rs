//! Background listener lifecycle
//!
//! An [`Endpoint`] is unbound until [`Endpoint::start`] consumes it. Each
//! listener runs on its own OS thread with a current-thread Tokio runtime, so
//! starting never blocks the caller and works from sync and async code alike.
//! Failures inside the thread are logged and recorded in the
//! [`ListenerState`]; they are never raised to the caller.

use std::net::SocketAddr;
use std::sync::Mutex;
use std::thread::JoinHandle;

use axum::Router;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};
use uuid::Uuid;

use crate::api::create_router;
use crate::config::Binding;
use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::types::ListenerState;

/// A handler and its binding, not yet listening
#[derive(Debug, Clone)]
pub struct Endpoint {
    handler: Handler,
    binding: Binding,
}

impl Endpoint {
    pub fn new(handler: Handler, binding: Binding) -> Self {
        Self { handler, binding }
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Router serving this endpoint, for callers embedding it elsewhere
    pub fn router(&self) -> Router {
        create_router(self.handler.clone(), &self.binding, Span::none())
    }

    /// Spawn the listener thread and return immediately.
    ///
    /// Only a failure to spawn the thread is reported here. Bind and serve
    /// errors surface through [`ListenerHandle::state`].
    pub fn start(self) -> Result<ListenerHandle> {
        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(ListenerState::Starting);

        let span = tracing::info_span!("listener", %id, addr = %self.binding.bind_address());
        let router = create_router(self.handler.clone(), &self.binding, span.clone());
        let binding = self.binding.clone();
        let thread_token = token.clone();

        let thread = std::thread::Builder::new()
            .name(format!("exposer-{}", binding.port()))
            .spawn(move || run_listener(span, binding, router, thread_token, state_tx))
            .map_err(|e| Error::Spawn(e.to_string()))?;

        tracing::debug!(%id, addr = %self.binding.bind_address(), "Listener thread spawned");

        Ok(ListenerHandle {
            id,
            binding: self.binding,
            token,
            state: state_rx,
            thread: Mutex::new(Some(thread)),
        })
    }
}

/// Handle to a running listener.
///
/// Dropping the handle leaves the listener running; call [`stop`](Self::stop)
/// to shut it down.
#[derive(Debug)]
pub struct ListenerHandle {
    id: Uuid,
    binding: Binding,
    token: CancellationToken,
    state: watch::Receiver<ListenerState>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl ListenerHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Current state snapshot
    pub fn state(&self) -> ListenerState {
        self.state.borrow().clone()
    }

    pub fn is_alive(&self) -> bool {
        !self.state.borrow().is_terminal()
    }

    /// Bound address, once listening
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.state.borrow() {
            ListenerState::Listening { addr } => Some(*addr),
            _ => None,
        }
    }

    /// URL of the endpoint on the bound address, once listening
    pub fn url(&self) -> Option<String> {
        self.local_addr()
            .map(|addr| format!("http://{}{}", addr, self.binding.route()))
    }

    /// Request a graceful shutdown. Returns without waiting.
    pub fn stop(&self) {
        tracing::info!(id = %self.id, "Stopping listener");
        self.token.cancel();
    }

    /// Wait until the socket is bound, or the listener ended first
    pub async fn wait_listening(&self) -> Result<SocketAddr> {
        let state = self
            .wait_for_state(|s| !matches!(s, ListenerState::Starting))
            .await;

        match state {
            ListenerState::Listening { addr } => Ok(addr),
            ListenerState::Failed { reason } => Err(Error::Listener(reason)),
            ListenerState::Stopped | ListenerState::Starting => {
                Err(Error::Listener("listener stopped before binding".into()))
            }
        }
    }

    /// Wait until the listener has stopped or failed
    pub async fn stopped(&self) -> ListenerState {
        self.wait_for_state(ListenerState::is_terminal).await
    }

    /// Block the current thread until the listener thread exits
    pub fn join(&self) -> ListenerState {
        let thread = match self.thread.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(thread) = thread {
            if thread.join().is_err() {
                tracing::error!(id = %self.id, "Listener thread panicked");
            }
        }

        self.state()
    }

    async fn wait_for_state<P>(&self, predicate: P) -> ListenerState
    where
        P: FnMut(&ListenerState) -> bool,
    {
        let mut rx = self.state.clone();
        let result = rx.wait_for(predicate).await.map(|state| state.clone());

        // Sender gone without a matching state: report whatever was last sent
        match result {
            Ok(state) => state,
            Err(_) => rx.borrow().clone(),
        }
    }
}

fn run_listener(
    span: Span,
    binding: Binding,
    router: Router,
    token: CancellationToken,
    state_tx: watch::Sender<ListenerState>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            span.in_scope(|| {
                record_failure(&state_tx, format!("failed to build runtime: {}", e))
            });
            return;
        }
    };

    let outcome = runtime.block_on(
        serve(&binding, router, token, &state_tx).instrument(span.clone()),
    );

    span.in_scope(|| match outcome {
        Ok(()) => {
            tracing::info!("Listener stopped");
            state_tx.send_replace(ListenerState::Stopped);
        }
        Err(e) => record_failure(&state_tx, e.to_string()),
    });
}

async fn serve(
    binding: &Binding,
    router: Router,
    token: CancellationToken,
    state_tx: &watch::Sender<ListenerState>,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(binding.bind_address()).await?;
    let addr = listener.local_addr()?;

    // Registered before reporting Listening so an early signal is not lost
    let interrupt = if binding.shutdown_on_ctrl_c() {
        Some(Interrupt::register()?)
    } else {
        None
    };

    println!("Server started http://{}:{}", binding.hostname(), addr.port());
    tracing::info!(
        %addr,
        methods = %binding.methods(),
        route = binding.route(),
        "Listening for HTTP traffic"
    );
    state_tx.send_replace(ListenerState::Listening { addr });

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(token, interrupt))
        .await?;

    Ok(())
}

/// Ctrl-c subscription created eagerly, unlike `tokio::signal::ctrl_c` which
/// only registers on first poll
struct Interrupt {
    #[cfg(unix)]
    signal: tokio::signal::unix::Signal,
}

impl Interrupt {
    #[cfg(unix)]
    fn register() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            signal: signal(SignalKind::interrupt())?,
        })
    }

    #[cfg(not(unix))]
    fn register() -> Result<Self> {
        Ok(Self {})
    }

    /// False if the signal stream closed without a signal
    #[cfg(unix)]
    async fn recv(&mut self) -> bool {
        self.signal.recv().await.is_some()
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> bool {
        match tokio::signal::ctrl_c().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to listen for ctrl-c: {}", e);
                false
            }
        }
    }
}

async fn shutdown_signal(token: CancellationToken, interrupt: Option<Interrupt>) {
    let Some(mut interrupt) = interrupt else {
        token.cancelled().await;
        return;
    };

    tokio::select! {
        _ = token.cancelled() => {}
        received = interrupt.recv() => {
            if received {
                tracing::info!("Received ctrl-c, shutting down");
            } else {
                token.cancelled().await;
            }
        }
    }
}

fn record_failure(state_tx: &watch::Sender<ListenerState>, reason: String) {
    tracing::error!("Listener failed: {}", reason);
    state_tx.send_replace(ListenerState::Failed { reason });
}
