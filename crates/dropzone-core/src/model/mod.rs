//! Drop records and their derived classification.

mod content;

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

pub use content::{ContentProfile, ContentType, PermittedActions};

/// Filename used when a drop has no usable title.
pub const FALLBACK_FILENAME: &str = "drop-file";

/// Opaque drop identifier.
///
/// The service emits integer keys; the client never interprets them, so they
/// are kept as text and compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DropId(String);

impl DropId {
    /// Wrap an identifier string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DropId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for DropId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DropId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for DropId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for DropId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DropId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(value) => Self::from(value),
            RawId::Text(value) => Self(value),
        })
    }
}

/// Release classification of a drop at an observation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Release {
    /// Release time is at or before the observation time.
    Released,
    /// Release time is still in the future.
    Upcoming,
}

/// Access level required to use a drop's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Entitlement {
    /// Available to every authenticated user.
    Free,
    /// Requires a premium entitlement, enforced by the service.
    Premium,
}

impl Entitlement {
    /// Badge text shown next to the drop.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Premium => "Premium",
        }
    }
}

/// Drop shape as returned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DropPayload {
    /// Service identifier.
    pub id: DropId,
    /// Display title.
    pub title: String,
    /// Optional description; blank means absent.
    #[serde(default)]
    pub description: Option<String>,
    /// Wire content type code.
    pub content_type: ContentType,
    /// Attachment URL when a file exists.
    #[serde(default)]
    pub file: Option<String>,
    /// Repository link for repository drops.
    #[serde(default)]
    pub github_link: Option<String>,
    /// Whether the drop is free.
    #[serde(default = "default_free")]
    pub is_free: bool,
    /// Scheduled release instant.
    pub release_time: DateTime<Utc>,
    /// Current user's bookmark relationship.
    #[serde(default)]
    pub is_bookmarked: bool,
}

const fn default_free() -> bool {
    true
}

/// Canonical drop record held by catalog snapshots.
///
/// Records only come from service payloads. Every field except the bookmark
/// flag is fixed for the session; the flag changes by producing a new copy
/// through [`DropRecord::with_bookmark`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DropPayload", into = "DropPayload")]
pub struct DropRecord {
    id: DropId,
    title: String,
    description: Option<String>,
    content_type: ContentType,
    release_time: DateTime<Utc>,
    is_free: bool,
    is_bookmarked: bool,
    attachment: Option<String>,
    external_link: Option<Url>,
}

impl From<DropPayload> for DropRecord {
    fn from(payload: DropPayload) -> Self {
        Self::from_payload(payload)
    }
}

impl From<DropRecord> for DropPayload {
    fn from(record: DropRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            content_type: record.content_type,
            file: record.attachment,
            github_link: record.external_link.map(String::from),
            is_free: record.is_free,
            release_time: record.release_time,
            is_bookmarked: record.is_bookmarked,
        }
    }
}

impl DropRecord {
    /// Normalise a service payload into a record.
    #[must_use]
    pub fn from_payload(payload: DropPayload) -> Self {
        let description = payload
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        let attachment = payload
            .file
            .map(|file| file.trim().to_string())
            .filter(|file| !file.is_empty());
        let external_link = match payload.content_type {
            ContentType::Repository => payload
                .github_link
                .as_deref()
                .and_then(|link| parse_external_link(&payload.id, link)),
            _ => None,
        };

        Self {
            id: payload.id,
            title: payload.title,
            description,
            content_type: payload.content_type,
            release_time: payload.release_time,
            is_free: payload.is_free,
            is_bookmarked: payload.is_bookmarked,
            attachment,
            external_link,
        }
    }

    /// Drop identifier.
    #[must_use]
    pub const fn id(&self) -> &DropId {
        &self.id
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Content type tag.
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Scheduled release instant.
    #[must_use]
    pub const fn release_time(&self) -> DateTime<Utc> {
        self.release_time
    }

    /// Whether the drop is free.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.is_free
    }

    /// Entitlement badge derived from `is_free`.
    #[must_use]
    pub const fn entitlement(&self) -> Entitlement {
        if self.is_free {
            Entitlement::Free
        } else {
            Entitlement::Premium
        }
    }

    /// Current user's bookmark relationship.
    #[must_use]
    pub const fn is_bookmarked(&self) -> bool {
        self.is_bookmarked
    }

    /// Whether a downloadable attachment exists.
    #[must_use]
    pub const fn file_present(&self) -> bool {
        self.attachment.is_some()
    }

    /// External repository link, only ever set for repository drops.
    #[must_use]
    pub const fn external_link(&self) -> Option<&Url> {
        self.external_link.as_ref()
    }

    /// Classify the drop against an observation time. Never cached.
    #[must_use]
    pub fn release_at(&self, now: DateTime<Utc>) -> Release {
        if self.release_time <= now {
            Release::Released
        } else {
            Release::Upcoming
        }
    }

    /// Whether the drop is released at `now`.
    #[must_use]
    pub fn is_released_at(&self, now: DateTime<Utc>) -> bool {
        self.release_at(now) == Release::Released
    }

    /// Actions a view may offer, combining the type table with what the record carries.
    #[must_use]
    pub const fn available_actions(&self) -> PermittedActions {
        let allowed = self.content_type.profile().actions;
        PermittedActions {
            download: allowed.download && self.attachment.is_some(),
            external_open: allowed.external_open && self.external_link.is_some(),
        }
    }

    /// Suggested local filename: the trimmed title, or a generic name when blank.
    #[must_use]
    pub fn suggested_filename(&self) -> String {
        let title = self.title.trim();
        if title.is_empty() {
            FALLBACK_FILENAME.to_string()
        } else {
            title.to_string()
        }
    }

    /// Copy of this record with the given bookmark state.
    #[must_use]
    pub fn with_bookmark(&self, bookmarked: bool) -> Self {
        Self {
            is_bookmarked: bookmarked,
            ..self.clone()
        }
    }
}

fn parse_external_link(id: &DropId, raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        Ok(url) => {
            tracing::warn!(drop_id = %id, scheme = url.scheme(), "ignoring non-http repository link");
            None
        }
        Err(err) => {
            tracing::warn!(drop_id = %id, error = %err, "ignoring malformed repository link");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn payload(content_type: ContentType) -> DropPayload {
        DropPayload {
            id: DropId::from(1),
            title: "Rust Atomics".into(),
            description: Some("  ".into()),
            content_type,
            file: None,
            github_link: Some("https://github.com/dropzone/atomics".into()),
            is_free: true,
            release_time: Utc::now() - Duration::days(1),
            is_bookmarked: false,
        }
    }

    #[test]
    fn release_is_recomputed_against_observation_time() {
        let record = DropRecord::from_payload(payload(ContentType::Document));
        let release = record.release_time();
        assert_eq!(record.release_at(release), Release::Released);
        assert_eq!(
            record.release_at(release - Duration::seconds(1)),
            Release::Upcoming
        );
        assert!(record.is_released_at(release + Duration::days(3)));
    }

    #[test]
    fn external_link_only_kept_for_repositories() {
        let document = DropRecord::from_payload(payload(ContentType::Document));
        assert!(document.external_link().is_none());
        assert!(!document.available_actions().external_open);

        let repo = DropRecord::from_payload(payload(ContentType::Repository));
        assert_eq!(
            repo.external_link().map(Url::as_str),
            Some("https://github.com/dropzone/atomics")
        );
        assert!(repo.available_actions().external_open);
    }

    #[test]
    fn non_http_links_are_dropped() {
        let mut raw = payload(ContentType::Repository);
        raw.github_link = Some("javascript:alert(1)".into());
        assert!(DropRecord::from_payload(raw).external_link().is_none());
    }

    #[test]
    fn blank_description_and_missing_file_normalise() {
        let mut raw = payload(ContentType::Cheatsheet);
        raw.file = Some(String::new());
        let record = DropRecord::from_payload(raw);
        assert!(record.description().is_none());
        assert!(!record.file_present());
        assert!(!record.available_actions().download);
    }

    #[test]
    fn download_needs_a_downloadable_type_and_a_file() {
        for (content_type, downloadable) in [
            (ContentType::Document, true),
            (ContentType::Cheatsheet, true),
            (ContentType::Repository, false),
            (ContentType::Other, false),
        ] {
            let mut raw = payload(content_type);
            raw.file = Some("/media/drops/atomics.zip".into());
            let record = DropRecord::from_payload(raw);
            assert!(record.file_present());
            assert_eq!(
                record.available_actions().download,
                downloadable,
                "{content_type:?}"
            );
        }
    }

    #[test]
    fn serializes_back_to_the_service_shape() -> anyhow::Result<()> {
        let mut raw = payload(ContentType::Repository);
        raw.file = Some("/media/drops/atomics.zip".into());
        raw.description = Some("Lock-free notes".into());
        let record = DropRecord::from_payload(raw);

        let value = serde_json::to_value(&record)?;
        assert_eq!(value["file"], "/media/drops/atomics.zip");
        assert_eq!(value["github_link"], "https://github.com/dropzone/atomics");
        assert_eq!(value["content_type"], "repo");

        let restored: DropRecord = serde_json::from_value(value)?;
        assert_eq!(restored, record);
        Ok(())
    }

    #[test]
    fn suggested_filename_falls_back_when_title_blank() {
        let mut raw = payload(ContentType::Document);
        raw.title = "   ".into();
        assert_eq!(
            DropRecord::from_payload(raw).suggested_filename(),
            FALLBACK_FILENAME
        );
        let named = DropRecord::from_payload(payload(ContentType::Document));
        assert_eq!(named.suggested_filename(), "Rust Atomics");
    }

    #[test]
    fn with_bookmark_changes_only_the_flag() {
        let record = DropRecord::from_payload(payload(ContentType::Document));
        let flipped = record.with_bookmark(true);
        assert!(flipped.is_bookmarked());
        assert_eq!(flipped.with_bookmark(false), record);
    }

    #[test]
    fn deserializes_service_json() -> anyhow::Result<()> {
        let record: DropRecord = serde_json::from_value(json!({
            "id": 42,
            "title": "Tokio Cheat Sheet",
            "description": "",
            "content_type": "cheatsheet",
            "file": "/media/drops/tokio.pdf",
            "github_link": null,
            "is_free": false,
            "release_time": "2025-01-02T03:04:05+02:00",
            "created_at": "2024-12-01T00:00:00Z",
            "updated_at": "2024-12-01T00:00:00Z",
            "is_bookmarked": true
        }))?;
        assert_eq!(record.id().as_str(), "42");
        assert_eq!(record.content_type(), ContentType::Cheatsheet);
        assert!(record.file_present());
        assert!(record.is_bookmarked());
        assert_eq!(record.entitlement(), Entitlement::Premium);
        assert_eq!(
            record.release_time().to_rfc3339(),
            "2025-01-02T01:04:05+00:00"
        );
        Ok(())
    }

    #[test]
    fn drop_id_accepts_text_and_numbers() -> anyhow::Result<()> {
        let numeric: DropId = serde_json::from_value(json!(7))?;
        let text: DropId = serde_json::from_value(json!("d1"))?;
        assert_eq!(numeric, DropId::from("7"));
        assert_eq!(text.to_string(), "d1");
        Ok(())
    }
}
