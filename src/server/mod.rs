//! TCP/TLS listener and per-connection dispatch.
//!
//! One detached handler thread per accepted connection; the corpus store is
//! the only shared resource. A failure in one handler never affects others
//! or the accept loop, and the accept loop never waits on handler
//! completion (beyond the configured connection bound).

mod client;
mod conn;
mod gate;
pub mod protocol;
pub mod signal;
mod tls;

pub use client::{ClientError, ClientResult, QueryClient};

use crate::config::ServerSettings;
use crate::corpus::{self, CorpusStore};
use crate::engine::QueryEngine;
use anyhow::{Context, Result};
use gate::ConnectionGate;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Per-connection read/write timeout
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// The query server: bound listener plus the shared query engine
pub struct Server {
    settings: Arc<ServerSettings>,
    store: Arc<dyn CorpusStore>,
    engine: Arc<QueryEngine>,
    tls: Option<Arc<rustls::ServerConfig>>,
    listener: TcpListener,
    gate: Arc<ConnectionGate>,
    shutdown: AtomicBool,
}

impl Server {
    /// Bind the listener and build the shared state.
    ///
    /// Unusable TLS material or an unbindable address is fatal here. An
    /// unreadable corpus is not: the server starts degraded and retries the
    /// load on each query.
    pub fn bind(settings: ServerSettings) -> Result<Arc<Self>> {
        let settings = Arc::new(settings);

        let tls = match &settings.tls {
            Some(material) => Some(tls::server_config(&material.cert_path, &material.key_path)?),
            None => None,
        };

        let store = corpus::open_store(&settings);
        match store.refresh() {
            Ok(()) => tracing::info!(path = %settings.corpus_path.display(), "corpus loaded"),
            Err(err) => {
                tracing::warn!("initial corpus load failed, starting degraded: {err}")
            }
        }

        let engine = Arc::new(QueryEngine::new(Arc::clone(&store), settings.refresh));
        let listener = TcpListener::bind(settings.bind_addr())
            .with_context(|| format!("Failed to bind to {}", settings.bind_addr()))?;
        let gate = ConnectionGate::new(settings.max_connections);

        Ok(Arc::new(Self {
            settings,
            store,
            engine,
            tls,
            listener,
            gate,
            shutdown: AtomicBool::new(false),
        }))
    }

    /// Address the listener actually bound (useful with port 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Request the accept loop to stop; in-flight handlers may finish
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Accept loop (blocking). Returns after [`Server::stop`], SIGINT or
    /// SIGTERM; SIGHUP forces a corpus rebuild and keeps serving.
    pub fn run(self: &Arc<Self>) -> Result<()> {
        tracing::info!(
            addr = %self.listener.local_addr()?,
            tls = self.tls.is_some(),
            backend = ?self.settings.backend,
            refresh = ?self.settings.refresh,
            "listening"
        );

        loop {
            if self.shutdown.load(Ordering::Relaxed) || signal::shutdown_requested() {
                break;
            }
            if signal::take_reload_request() {
                match self.store.force_refresh() {
                    Ok(()) => tracing::info!("corpus rebuilt on reload signal"),
                    Err(err) => tracing::warn!("reload signal failed: {err}"),
                }
            }

            let (stream, peer) = match self.listener.accept() {
                Ok(pair) => pair,
                // EINTR after a signal: loop around to observe the flags.
                // A peer that vanished between accept and return only
                // concerns that connection.
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::Interrupted
                            | io::ErrorKind::ConnectionAborted
                            | io::ErrorKind::ConnectionReset
                    ) =>
                {
                    continue;
                }
                Err(err) => {
                    return Err(err).context("Listener socket failed");
                }
            };

            let _ = stream.set_read_timeout(Some(CONNECTION_TIMEOUT));
            let _ = stream.set_write_timeout(Some(CONNECTION_TIMEOUT));

            let permit = self.gate.acquire();
            let server = Arc::clone(self);
            thread::spawn(move || {
                let _permit = permit;
                server.handle(stream, peer);
            });
        }

        tracing::info!("accept loop stopped");
        Ok(())
    }

    /// Run one connection to completion, isolating its failures
    fn handle(&self, stream: TcpStream, peer: SocketAddr) {
        tracing::debug!(%peer, active = self.gate.active(), "connection accepted");

        let outcome = match &self.tls {
            Some(config) => match rustls::ServerConnection::new(Arc::clone(config)) {
                Ok(session) => {
                    let mut stream = rustls::StreamOwned::new(session, stream);
                    conn::serve(&mut stream, &self.engine)
                }
                Err(err) => {
                    tracing::debug!(%peer, "TLS session setup failed: {err}");
                    return;
                }
            },
            None => {
                let mut stream = stream;
                conn::serve(&mut stream, &self.engine)
            }
        };

        if let Err(err) = outcome {
            tracing::debug!(%peer, "connection error: {err}");
        }
    }
}
