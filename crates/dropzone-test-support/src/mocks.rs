//! Scripted `DropService` used by engine and CLI tests.
//!
//! Every remote operation answers from a script the test installs. Any
//! operation can be held at a gate so tests can observe the optimistic state
//! before the remote call settles, or settle calls out of order.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use dropzone_core::{
    DownloadPayload, DropId, DropRecord, DropService, HealthStatus, ServiceError, ServiceResult,
    ToggleAck,
};
use tokio::sync::Semaphore;

/// Remote operations the mock can script, count, and hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `released_drops`.
    Released,
    /// `upcoming_drops`.
    Upcoming,
    /// `bookmarked_drops`.
    Bookmarked,
    /// `drop_by_id`.
    Detail,
    /// `toggle_bookmark`.
    Toggle,
    /// `download`.
    Download,
    /// `health`.
    Health,
}

impl Operation {
    const fn name(self) -> &'static str {
        match self {
            Self::Released => "released_drops",
            Self::Upcoming => "upcoming_drops",
            Self::Bookmarked => "bookmarked_drops",
            Self::Detail => "drop_by_id",
            Self::Toggle => "toggle_bookmark",
            Self::Download => "download",
            Self::Health => "health",
        }
    }
}

/// Scripted failure, materialised into a fresh [`ServiceError`] per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// 401/403 with an optional message.
    Denied(Option<String>),
    /// 404.
    NotFound,
    /// Connection failure.
    Offline,
    /// Any other status.
    Status(u16, String),
}

impl MockFailure {
    fn into_error(self, operation: Operation) -> ServiceError {
        let operation = operation.name();
        match self {
            Self::Denied(message) => ServiceError::AccessDenied { operation, message },
            Self::NotFound => ServiceError::NotFound { operation },
            Self::Offline => ServiceError::Transient {
                operation,
                source: Box::new(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )),
            },
            Self::Status(status, message) => ServiceError::Status {
                operation,
                status,
                message,
            },
        }
    }
}

/// Two-sided gate holding a scripted call until the test releases it.
#[derive(Debug)]
pub struct CallGate {
    entered: Semaphore,
    proceed: Semaphore,
}

impl CallGate {
    fn new() -> Self {
        Self {
            entered: Semaphore::new(0),
            proceed: Semaphore::new(0),
        }
    }

    /// Wait until one more held call has reached the gate.
    pub async fn entered(&self) {
        if let Ok(permit) = self.entered.acquire().await {
            permit.forget();
        }
    }

    /// Let one held call continue.
    pub fn release(&self) {
        self.proceed.add_permits(1);
    }

    /// Let every current and future held call continue.
    pub fn open(&self) {
        self.proceed.close();
    }

    async fn pass(&self) {
        self.entered.add_permits(1);
        // A closed semaphore means the gate was opened for good.
        if let Ok(permit) = self.proceed.acquire().await {
            permit.forget();
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    released: Option<Result<Vec<DropRecord>, MockFailure>>,
    upcoming: Option<Result<Vec<DropRecord>, MockFailure>>,
    bookmarked: Option<Result<Vec<DropRecord>, MockFailure>>,
    details: HashMap<DropId, Result<DropRecord, MockFailure>>,
    downloads: HashMap<DropId, Result<DownloadPayload, MockFailure>>,
    toggle_failures: HashMap<DropId, MockFailure>,
    toggle_ack: Option<ToggleAck>,
    health: Option<Result<HealthStatus, MockFailure>>,
    server_bookmarks: HashSet<DropId>,
    calls: HashMap<Operation, usize>,
    toggled: Vec<DropId>,
    gates: HashMap<Operation, Arc<CallGate>>,
}

/// In-memory drop service answering from scripted results.
///
/// Unscripted collections answer with an empty list. Toggles flip a
/// server-side bookmark set seeded from the bookmarked script and report the
/// new state, unless a failure or fixed ack was scripted.
#[derive(Debug, Default)]
pub struct MockDropService {
    script: Mutex<Script>,
}

impl MockDropService {
    /// Service with nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `released_drops`.
    #[must_use]
    pub fn with_released(self, drops: Vec<DropRecord>) -> Self {
        self.set_released(Ok(drops));
        self
    }

    /// Script `upcoming_drops`.
    #[must_use]
    pub fn with_upcoming(self, drops: Vec<DropRecord>) -> Self {
        self.set_upcoming(Ok(drops));
        self
    }

    /// Script `bookmarked_drops` and seed the server-side bookmark set.
    #[must_use]
    pub fn with_bookmarked(self, drops: Vec<DropRecord>) -> Self {
        self.set_bookmarked(Ok(drops));
        self
    }

    /// Replace the `released_drops` script.
    pub fn set_released(&self, result: Result<Vec<DropRecord>, MockFailure>) {
        self.lock().released = Some(result);
    }

    /// Replace the `upcoming_drops` script.
    pub fn set_upcoming(&self, result: Result<Vec<DropRecord>, MockFailure>) {
        self.lock().upcoming = Some(result);
    }

    /// Replace the `bookmarked_drops` script.
    pub fn set_bookmarked(&self, result: Result<Vec<DropRecord>, MockFailure>) {
        let mut script = self.lock();
        if let Ok(drops) = &result {
            script.server_bookmarks = drops.iter().map(|drop| drop.id().clone()).collect();
        }
        script.bookmarked = Some(result);
    }

    /// Script `drop_by_id` for one id.
    pub fn set_detail(&self, id: &DropId, result: Result<DropRecord, MockFailure>) {
        self.lock().details.insert(id.clone(), result);
    }

    /// Script `download` for one id.
    pub fn set_download(&self, id: &DropId, result: Result<DownloadPayload, MockFailure>) {
        self.lock().downloads.insert(id.clone(), result);
    }

    /// Make every toggle of `id` fail until cleared.
    pub fn fail_toggle(&self, id: &DropId, failure: MockFailure) {
        self.lock().toggle_failures.insert(id.clone(), failure);
    }

    /// Let toggles of `id` succeed again.
    pub fn clear_toggle_failure(&self, id: &DropId) {
        self.lock().toggle_failures.remove(id);
    }

    /// Answer every successful toggle with a fixed ack instead of the tracked state.
    pub fn set_toggle_ack(&self, ack: ToggleAck) {
        self.lock().toggle_ack = Some(ack);
    }

    /// Script the health probe.
    pub fn set_health(&self, result: Result<HealthStatus, MockFailure>) {
        self.lock().health = Some(result);
    }

    /// Hold every future call of `operation` at a gate.
    #[must_use]
    pub fn hold(&self, operation: Operation) -> Arc<CallGate> {
        let gate = Arc::new(CallGate::new());
        self.lock().gates.insert(operation, Arc::clone(&gate));
        gate
    }

    /// Number of calls made to `operation`.
    #[must_use]
    pub fn calls(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    /// Ids passed to successful or failed toggles, in call order.
    #[must_use]
    pub fn toggled(&self) -> Vec<DropId> {
        self.lock().toggled.clone()
    }

    /// Server-side bookmark membership after the toggles seen so far.
    #[must_use]
    pub fn server_bookmarked(&self, id: &DropId) -> bool {
        self.lock().server_bookmarks.contains(id)
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter(&self, operation: Operation) {
        let gate = {
            let mut script = self.lock();
            *script.calls.entry(operation).or_default() += 1;
            script.gates.get(&operation).cloned()
        };
        if let Some(gate) = gate {
            gate.pass().await;
        }
    }

    fn collection(
        &self,
        operation: Operation,
        pick: impl FnOnce(&Script) -> Option<Result<Vec<DropRecord>, MockFailure>>,
    ) -> ServiceResult<Vec<DropRecord>> {
        pick(&self.lock())
            .unwrap_or_else(|| Ok(Vec::new()))
            .map_err(|failure| failure.into_error(operation))
    }
}

#[async_trait]
impl DropService for MockDropService {
    async fn released_drops(&self) -> ServiceResult<Vec<DropRecord>> {
        self.enter(Operation::Released).await;
        self.collection(Operation::Released, |script| script.released.clone())
    }

    async fn upcoming_drops(&self) -> ServiceResult<Vec<DropRecord>> {
        self.enter(Operation::Upcoming).await;
        self.collection(Operation::Upcoming, |script| script.upcoming.clone())
    }

    async fn bookmarked_drops(&self) -> ServiceResult<Vec<DropRecord>> {
        self.enter(Operation::Bookmarked).await;
        self.collection(Operation::Bookmarked, |script| script.bookmarked.clone())
    }

    async fn drop_by_id(&self, id: &DropId) -> ServiceResult<DropRecord> {
        self.enter(Operation::Detail).await;
        self.lock()
            .details
            .get(id)
            .cloned()
            .unwrap_or(Err(MockFailure::NotFound))
            .map_err(|failure| failure.into_error(Operation::Detail))
    }

    async fn toggle_bookmark(&self, id: &DropId) -> ServiceResult<ToggleAck> {
        self.enter(Operation::Toggle).await;
        let mut script = self.lock();
        script.toggled.push(id.clone());
        if let Some(failure) = script.toggle_failures.get(id).cloned() {
            return Err(failure.into_error(Operation::Toggle));
        }
        let bookmarked = if script.server_bookmarks.remove(id) {
            false
        } else {
            script.server_bookmarks.insert(id.clone());
            true
        };
        Ok(script.toggle_ack.unwrap_or(ToggleAck {
            bookmarked: Some(bookmarked),
        }))
    }

    async fn download(&self, id: &DropId) -> ServiceResult<DownloadPayload> {
        self.enter(Operation::Download).await;
        self.lock()
            .downloads
            .get(id)
            .cloned()
            .unwrap_or(Err(MockFailure::NotFound))
            .map_err(|failure| failure.into_error(Operation::Download))
    }

    async fn health(&self) -> ServiceResult<HealthStatus> {
        self.enter(Operation::Health).await;
        self.lock()
            .health
            .clone()
            .unwrap_or_else(|| {
                Ok(HealthStatus {
                    status: "healthy".into(),
                    message: None,
                })
            })
            .map_err(|failure| failure.into_error(Operation::Health))
    }
}
