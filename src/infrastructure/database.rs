use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::DatabaseConfig;
use crate::lifecycle::{LifecycleError, OnApplicationBootstrap, OnModuleDestroy};

const DEFAULT_DATABASE_PORT: u16 = 27017;

pub type DbResult<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Database at {addr} is unreachable: {source}")]
    Unreachable {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connecting to {addr} timed out after {timeout:?}")]
    Timeout { addr: String, timeout: Duration },

    #[error("Gave up after {attempts} connection attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<DatabaseError>,
    },

    #[error("Database is {0}")]
    Unavailable(ConnectionState),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Host, port and database name taken from a connection URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub database: Option<String>,
}

impl Endpoint {
    /// Parses `scheme://[user[:pass]@]host[:port][,more hosts][/database][?options]`.
    ///
    /// Only the first host of a seed list is used.
    pub fn parse(url: &str) -> Result<Self, DatabaseError> {
        let invalid = |reason: &str| DatabaseError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = url.split_once("://").ok_or_else(|| invalid("missing scheme"))?;
        if scheme.is_empty() {
            return Err(invalid("missing scheme"));
        }

        let (authority, path) = match rest.find(['/', '?']) {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };
        let hosts = authority.rsplit_once('@').map_or(authority, |(_, hosts)| hosts);
        let first = hosts.split(',').next().unwrap_or_default();

        let (host, port) = if let Some(bracketed) = first.strip_prefix('[') {
            let (host, tail) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid("unterminated IPv6 address"))?;
            (host, tail.strip_prefix(':'))
        } else {
            match first.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (first, None),
            }
        };

        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        let port = match port {
            Some(p) => p.parse::<u16>().map_err(|_| invalid("invalid port"))?,
            None => DEFAULT_DATABASE_PORT,
        };

        let database = path
            .strip_prefix('/')
            .map(|p| p.split('?').next().unwrap_or_default())
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        Ok(Self {
            host: host.to_string(),
            port,
            database,
        })
    }

    pub fn addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// An open connection to the database service.
pub struct Session {
    peer: String,
    _stream: Option<TcpStream>,
}

impl Session {
    pub fn new(peer: impl Into<String>, stream: TcpStream) -> Self {
        Self {
            peer: peer.into(),
            _stream: Some(stream),
        }
    }

    /// A session with no underlying socket, for connectors that manage
    /// transport themselves.
    pub fn detached(peer: impl Into<String>) -> Self {
        Self {
            peer: peer.into(),
            _stream: None,
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Session, DatabaseError>;
}

/// Opens a TCP connection to the endpoint.
pub struct TcpConnector {
    timeout: Duration,
}

impl TcpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Session, DatabaseError> {
        let addr = endpoint.addr();
        let stream = tokio::time::timeout(
            self.timeout,
            TcpStream::connect((endpoint.host.as_str(), endpoint.port)),
        )
        .await
        .map_err(|_| DatabaseError::Timeout {
            addr: addr.clone(),
            timeout: self.timeout,
        })?
        .map_err(|source| DatabaseError::Unreachable {
            addr: addr.clone(),
            source,
        })?;

        Ok(Session::new(addr, stream))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based): doubles each time,
    /// capped at `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }
}

impl From<&DatabaseConfig> for RetryPolicy {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_attempts: config.connect_attempts.max(1),
            initial_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
        }
    }
}

/// A named set of JSON documents keyed by id.
#[derive(Clone)]
pub struct Collection {
    documents: Arc<DashMap<String, Value>>,
}

impl Collection {
    pub fn insert(&self, id: &str, document: Value) {
        self.documents.insert(id.to_string(), document);
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        self.documents.get(id).map(|doc| doc.value().clone())
    }

    pub fn remove(&self, id: &str) -> Option<Value> {
        self.documents.remove(id).map(|(_, doc)| doc)
    }

    pub fn scan(&self) -> Vec<Value> {
        self.documents
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

struct DatabaseInner {
    url: String,
    connector: Arc<dyn Connector>,
    retry: RetryPolicy,
    state: watch::Sender<ConnectionState>,
    attempts: AtomicU32,
    session: Mutex<Option<Session>>,
    connect_task: Mutex<Option<JoinHandle<()>>>,
    collections: DashMap<String, Collection>,
}

/// Shared database handle.
///
/// Cloning is cheap; all clones observe the same connection state. Storage is
/// only reachable while the state is [`ConnectionState::Connected`].
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    pub fn new(config: &DatabaseConfig, connector: Arc<dyn Connector>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(DatabaseInner {
                url: config.url.clone(),
                connector,
                retry: RetryPolicy::from(config),
                state,
                attempts: AtomicU32::new(0),
                session: Mutex::new(None),
                connect_task: Mutex::new(None),
                collections: DashMap::new(),
            }),
        }
    }

    pub fn with_tcp(config: &DatabaseConfig) -> Self {
        Self::new(config, Arc::new(TcpConnector::new(config.connect_timeout)))
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Total connection attempts made by this handle.
    pub fn attempts(&self) -> u32 {
        self.inner.attempts.load(Ordering::Relaxed)
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Waits until the state equals `target`. Returns false on timeout.
    pub async fn wait_for_state(&self, target: ConnectionState, timeout: Duration) -> bool {
        let mut rx = self.subscribe();
        tokio::time::timeout(timeout, rx.wait_for(|state| *state == target))
            .await
            .is_ok_and(|result| result.is_ok())
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.inner.state.send_replace(state);
        if previous != state {
            tracing::debug!(from = %previous, to = %state, "Database state changed");
        }
    }

    /// Attempts to connect, retrying with exponential backoff up to the
    /// policy's attempt limit.
    pub async fn connect_with_retry(&self) -> Result<(), DatabaseError> {
        let endpoint = match Endpoint::parse(&self.inner.url) {
            Ok(endpoint) => endpoint,
            Err(err) => {
                tracing::error!(error = %err, "Database connection error");
                self.set_state(ConnectionState::Disconnected);
                return Err(err);
            }
        };

        let retry = self.inner.retry;
        self.set_state(ConnectionState::Connecting);

        let mut attempt = 0;
        loop {
            attempt += 1;
            self.inner.attempts.fetch_add(1, Ordering::Relaxed);

            match self.inner.connector.connect(&endpoint).await {
                Ok(session) => {
                    tracing::info!(peer = %session.peer(), attempt, "Connected to database");
                    // State changes under the session lock so `close` never
                    // observes Connected without a session.
                    let mut slot = self
                        .inner
                        .session
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    *slot = Some(session);
                    self.set_state(ConnectionState::Connected);
                    return Ok(());
                }
                Err(err) if attempt >= retry.max_attempts => {
                    tracing::error!(
                        error = %err,
                        attempts = attempt,
                        "Database connection error; giving up"
                    );
                    self.set_state(ConnectionState::Disconnected);
                    return Err(DatabaseError::Exhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = retry.backoff(attempt);
                    tracing::warn!(
                        error = %err,
                        attempt,
                        max_attempts = retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Database connection attempt failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Starts [`Database::connect_with_retry`] in the background.
    ///
    /// A previous connect task still running is aborted first.
    pub fn spawn_connect(&self) {
        let db = self.clone();
        let handle = tokio::spawn(async move {
            if db.connect_with_retry().await.is_err() {
                tracing::warn!("Continuing without database; storage requests will be refused");
            }
        });

        let previous = self
            .inner
            .connect_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Drops the session and aborts any pending connect task.
    pub fn close(&self) {
        if let Some(task) = self
            .inner
            .connect_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }

        let session = {
            let mut slot = self
                .inner
                .session
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.set_state(ConnectionState::Disconnected);
            slot.take()
        };

        if let Some(session) = session {
            tracing::info!(peer = %session.peer(), "Database connection closed");
        }
    }

    /// Returns the named collection, or `Unavailable` unless connected.
    pub fn collection(&self, name: &str) -> Result<Collection, DatabaseError> {
        let state = self.state();
        if state != ConnectionState::Connected {
            return Err(DatabaseError::Unavailable(state));
        }

        Ok(self
            .inner
            .collections
            .entry(name.to_string())
            .or_insert_with(|| Collection {
                documents: Arc::new(DashMap::new()),
            })
            .value()
            .clone())
    }
}

#[async_trait]
impl OnApplicationBootstrap for Database {
    async fn on_application_bootstrap(&mut self) -> Result<(), LifecycleError> {
        tracing::info!(url = %self.url(), "Connecting to database in the background");
        self.spawn_connect();
        Ok(())
    }
}

#[async_trait]
impl OnModuleDestroy for Database {
    async fn on_module_destroy(&mut self) -> Result<(), LifecycleError> {
        self.close();
        Ok(())
    }
}
