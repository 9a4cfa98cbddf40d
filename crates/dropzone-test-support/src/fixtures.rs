//! Drop builders and a controllable clock.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, TimeZone, Utc};
use dropzone_core::{Clock, ContentType, DropId, DropPayload, DropRecord};
use serde_json::{Value, json};

/// Instant every fixture is relative to.
#[must_use]
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Builder for drop records and their wire JSON.
#[derive(Debug, Clone)]
pub struct DropFixture {
    payload: DropPayload,
}

impl DropFixture {
    /// Free document released a day before [`fixture_now`], with a file attached.
    #[must_use]
    pub fn released(id: &str) -> Self {
        Self {
            payload: DropPayload {
                id: DropId::from(id),
                title: format!("Drop {id}"),
                description: Some(format!("Notes for drop {id}")),
                content_type: ContentType::Document,
                file: Some(format!("/media/drops/{id}.pdf")),
                github_link: None,
                is_free: true,
                release_time: fixture_now() - Duration::days(1),
                is_bookmarked: false,
            },
        }
    }

    /// Free document releasing two days after [`fixture_now`].
    #[must_use]
    pub fn upcoming(id: &str) -> Self {
        Self::released(id).release_time(fixture_now() + Duration::days(2))
    }

    /// Repository drop released a day ago with a GitHub link and no file.
    #[must_use]
    pub fn repository(id: &str) -> Self {
        Self::released(id)
            .content_type(ContentType::Repository)
            .no_file()
            .github_link(&format!("https://github.com/dropzone/{id}"))
    }

    /// Override the title.
    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.payload.title = title.to_string();
        self
    }

    /// Override the description.
    #[must_use]
    pub fn description(mut self, description: Option<&str>) -> Self {
        self.payload.description = description.map(str::to_string);
        self
    }

    /// Override the content type.
    #[must_use]
    pub const fn content_type(mut self, content_type: ContentType) -> Self {
        self.payload.content_type = content_type;
        self
    }

    /// Remove the file attachment.
    #[must_use]
    pub fn no_file(mut self) -> Self {
        self.payload.file = None;
        self
    }

    /// Set the attachment path.
    #[must_use]
    pub fn file(mut self, file: &str) -> Self {
        self.payload.file = Some(file.to_string());
        self
    }

    /// Set the repository link.
    #[must_use]
    pub fn github_link(mut self, link: &str) -> Self {
        self.payload.github_link = Some(link.to_string());
        self
    }

    /// Mark the drop premium.
    #[must_use]
    pub const fn premium(mut self) -> Self {
        self.payload.is_free = false;
        self
    }

    /// Set the bookmark flag the service reports.
    #[must_use]
    pub const fn bookmarked(mut self, bookmarked: bool) -> Self {
        self.payload.is_bookmarked = bookmarked;
        self
    }

    /// Override the release instant.
    #[must_use]
    pub const fn release_time(mut self, at: DateTime<Utc>) -> Self {
        self.payload.release_time = at;
        self
    }

    /// Normalised record.
    #[must_use]
    pub fn build(self) -> DropRecord {
        DropRecord::from_payload(self.payload)
    }

    /// Raw payload.
    #[must_use]
    pub fn payload(self) -> DropPayload {
        self.payload
    }

    /// Wire JSON as the service renders it.
    #[must_use]
    pub fn json(self) -> Value {
        let payload = self.payload;
        let id = payload
            .id
            .as_str()
            .parse::<u64>()
            .map_or_else(|_| json!(payload.id.as_str()), |numeric| json!(numeric));
        json!({
            "id": id,
            "title": payload.title,
            "description": payload.description.unwrap_or_default(),
            "content_type": payload.content_type.wire_code(),
            "file": payload.file,
            "github_link": payload.github_link,
            "is_free": payload.is_free,
            "release_time": payload.release_time.to_rfc3339(),
            "created_at": payload.release_time.to_rfc3339(),
            "updated_at": payload.release_time.to_rfc3339(),
            "is_bookmarked": payload.is_bookmarked,
        })
    }
}

/// Clock pinned to an instant that tests move explicitly.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Clock reading `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock reading [`fixture_now`].
    #[must_use]
    pub fn at_fixture_now() -> Self {
        Self::new(fixture_now())
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
