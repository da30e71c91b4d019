// ── Refresh coordinator ──
//
// Lifecycle for one portal account: log in, settle on a club, refresh all
// data sections on an interval, and publish each snapshot through a
// `watch` channel.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use nrgym_api::{FALLBACK_CLUB_ID, PortalClient, TransportConfig};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_UPDATE_INTERVAL, PortalConfig};
use crate::error::CoreError;
use crate::model::{Section, Snapshot};

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Coordinator ──────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Owns the portal client,
/// the latest [`Snapshot`], and the background refresh task.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: PortalConfig,
    client: PortalClient,
    /// Club resolved at connect time when none is configured.
    club_id: RwLock<Option<i64>>,
    snapshot: watch::Sender<Arc<Snapshot>>,
    connection_state: watch::Sender<ConnectionState>,
    /// Parent token; `shutdown` cancels a child so `start` can run again.
    cancel: CancellationToken,
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    /// Build the coordinator and its HTTP client. Does NOT log in; call
    /// [`connect()`](Self::connect).
    pub fn new(config: PortalConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let client = PortalClient::new(config.url.clone(), config.credentials.clone(), &transport)?
            .with_bookings_path(config.bookings_path.clone());

        let (snapshot, _) = watch::channel(Arc::new(Snapshot::empty(
            config.club_id.unwrap_or(FALLBACK_CLUB_ID),
        )));
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Ok(Self {
            inner: Arc::new(CoordinatorInner {
                config,
                client,
                club_id: RwLock::new(None),
                snapshot,
                connection_state,
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Access the coordinator configuration.
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// The underlying portal client, for ad-hoc queries.
    pub fn client(&self) -> &PortalClient {
        &self.inner.client
    }

    /// Club used for bookings: configured, else resolved at connect time,
    /// else the portal's default club.
    pub fn club_id(&self) -> i64 {
        self.inner
            .config
            .club_id
            .or(*self.inner.club_id.read().expect("club lock poisoned"))
            .unwrap_or(FALLBACK_CLUB_ID)
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Log in and settle on the club used for bookings.
    ///
    /// Without a configured club the member's home club is adopted; if the
    /// identity lookup fails for any reason other than authentication, the
    /// default club is used instead.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Connecting);

        if let Err(e) = self.inner.client.login().await {
            let _ = self.inner.connection_state.send(ConnectionState::Failed);
            return Err(e.into());
        }
        debug!("portal login successful");

        if self.inner.config.club_id.is_none() {
            let club = match self.inner.client.get_identity().await {
                Ok(identity) => identity.home_club_id,
                Err(e) if e.is_auth() => {
                    let _ = self.inner.connection_state.send(ConnectionState::Failed);
                    return Err(e.into());
                }
                Err(e) => {
                    warn!(error = %e, "identity lookup failed, using default club");
                    None
                }
            };
            let club = club.unwrap_or(FALLBACK_CLUB_ID);
            *self.inner.club_id.write().expect("club lock poisoned") = Some(club);
            debug!(club_id = club, "adopted club for bookings");
        }

        let _ = self.inner.connection_state.send(ConnectionState::Connected);
        info!(club_id = self.club_id(), "connected to gym portal");
        Ok(())
    }

    /// Run one refresh cycle and publish the result.
    ///
    /// Bookings, occupancy, identity, profile and contracts are fetched in
    /// that order. Each lands in its own [`Section`]; a failure in one does
    /// not stop the rest.
    pub async fn refresh(&self) -> Arc<Snapshot> {
        let client = &self.inner.client;
        let config = &self.inner.config;
        let club_id = self.club_id();

        let bookings = section("bookings", client.get_bookings(club_id).await);
        let occupancy = section("occupancy", client.get_occupancy().await);
        let identity = section("identity", client.get_identity().await);
        let profile = section("profile", client.get_profile(config.user_id).await);
        let contracts = section("contracts", client.get_contracts(config.user_id).await);

        let snapshot = Arc::new(Snapshot {
            refreshed_at: Some(Utc::now()),
            club_id,
            bookings,
            occupancy,
            identity,
            profile,
            contracts,
        });

        let failed = snapshot.unavailable_sections();
        if failed.is_empty() {
            debug!("refresh complete");
        } else {
            warn!(sections = ?failed, "refresh complete with unavailable sections");
        }

        self.inner.snapshot.send_replace(Arc::clone(&snapshot));
        snapshot
    }

    /// Refresh now, then keep refreshing every update interval in the
    /// background until [`shutdown()`](Self::shutdown).
    pub async fn start(&self) -> Arc<Snapshot> {
        let snapshot = self.refresh().await;

        let period = match self.inner.config.update_interval {
            d if d.is_zero() => DEFAULT_UPDATE_INTERVAL,
            d => d,
        };
        let cancel = {
            let mut child = self.inner.cancel_child.lock().await;
            if child.is_cancelled() {
                *child = self.inner.cancel.child_token();
            }
            child.clone()
        };

        let coordinator = self.clone();
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(refresh_task(coordinator, period, cancel)));
        debug!(interval_secs = period.as_secs(), "background refresh started");
        snapshot
    }

    /// Stop background refreshes and drop the session.
    pub async fn shutdown(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        self.inner.client.logout();
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Disconnected);
        debug!("coordinator shut down");
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, shut down.
    ///
    /// For CLI use; no background refresh is started.
    pub async fn oneshot<F, Fut, T>(config: PortalConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Coordinator) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let coordinator = Coordinator::new(config)?;
        coordinator.connect().await?;
        let result = f(coordinator.clone()).await;
        coordinator.shutdown().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.inner.snapshot.subscribe()
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }
}

fn section<T>(name: &str, result: Result<T, nrgym_api::Error>) -> Section<T> {
    if let Err(ref e) = result {
        warn!(section = name, error = %e, "section unavailable");
    }
    Section::from(result.map_err(CoreError::from))
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically refresh data from the portal.
async fn refresh_task(coordinator: Coordinator, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                coordinator.refresh().await;
            }
        }
    }
}
