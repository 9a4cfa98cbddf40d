//! Recording doubles for the access gate's local side effects.

use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use dropzone_core::{DownloadPayload, ExternalNavigation, FileSink, LinkOpener, OpenError, SavedFile};

/// One payload handed to [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCall {
    /// Name the engine suggested.
    pub suggested_name: String,
    /// Bytes received.
    pub body: Vec<u8>,
}

/// File sink keeping payloads in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    saved: Mutex<Vec<SavedCall>>,
    fail: Mutex<bool>,
}

impl RecordingSink {
    /// Sink accepting every payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink rejecting every payload with an I/O error.
    #[must_use]
    pub fn failing() -> Self {
        let sink = Self::default();
        *sink.fail.lock().unwrap_or_else(PoisonError::into_inner) = true;
        sink
    }

    /// Payloads saved so far.
    #[must_use]
    pub fn saved(&self) -> Vec<SavedCall> {
        lock(&self.saved).clone()
    }
}

#[async_trait]
impl FileSink for RecordingSink {
    async fn save(
        &self,
        suggested_name: &str,
        payload: &DownloadPayload,
    ) -> Result<SavedFile, Box<dyn Error + Send + Sync>> {
        if *lock(&self.fail) {
            return Err(Box::new(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "sink is read-only",
            )));
        }
        lock(&self.saved).push(SavedCall {
            suggested_name: suggested_name.to_string(),
            body: payload.body.clone(),
        });
        Ok(SavedFile {
            path: PathBuf::from(suggested_name),
            bytes: payload.len(),
        })
    }
}

/// Scripted opener outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenerMode {
    /// Accept every navigation.
    #[default]
    Accept,
    /// Refuse with a denial.
    Deny,
    /// Fail as if the launcher crashed.
    Fail,
}

/// Link opener that records navigations instead of launching anything.
#[derive(Debug, Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<ExternalNavigation>>,
    mode: OpenerMode,
}

impl RecordingOpener {
    /// Opener accepting every navigation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opener with a scripted outcome.
    #[must_use]
    pub fn with_mode(mode: OpenerMode) -> Self {
        Self {
            opened: Mutex::default(),
            mode,
        }
    }

    /// Navigations accepted so far.
    #[must_use]
    pub fn opened(&self) -> Vec<ExternalNavigation> {
        lock(&self.opened).clone()
    }
}

#[async_trait]
impl LinkOpener for RecordingOpener {
    async fn open(&self, navigation: &ExternalNavigation) -> Result<(), OpenError> {
        match self.mode {
            OpenerMode::Accept => {
                lock(&self.opened).push(navigation.clone());
                Ok(())
            }
            OpenerMode::Deny => Err(OpenError::Denied {
                message: Some("Forbidden".into()),
            }),
            OpenerMode::Fail => Err(OpenError::Failed {
                source: Box::new(io::Error::new(io::ErrorKind::NotFound, "no browser")),
            }),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
