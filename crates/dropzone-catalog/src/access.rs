//! Download and external-open gating.

use std::sync::Arc;

use dropzone_core::{
    CatalogError, CatalogResult, DownloadPayload, DropRecord, DropService, ExternalNavigation,
    FileSink, LinkOpener, OpenError, SavedFile,
};
use dropzone_events::Event;

use crate::sink::split_extension;
use crate::store::CatalogStore;

/// Decides whether a drop may be downloaded or opened, then performs the action.
#[derive(Clone)]
pub struct AccessGate {
    service: Arc<dyn DropService>,
    store: CatalogStore,
    sink: Arc<dyn FileSink>,
    opener: Arc<dyn LinkOpener>,
}

impl AccessGate {
    /// Gate saving through `sink` and opening links through `opener`.
    #[must_use]
    pub fn new(
        service: Arc<dyn DropService>,
        store: CatalogStore,
        sink: Arc<dyn FileSink>,
        opener: Arc<dyn LinkOpener>,
    ) -> Self {
        Self {
            service,
            store,
            sink,
            opener,
        }
    }

    /// Download a released drop's file and hand it to the sink.
    ///
    /// No remote call is made for drops without a file or whose type has no
    /// download action. The drop shows as
    /// downloading until this future completes or is dropped.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ContractViolation`] when the drop is unreleased, has no
    ///   file, or is a repository or other drop.
    /// - [`CatalogError::AccessDenied`] when the service refuses (403).
    /// - [`CatalogError::NotFound`], [`CatalogError::TransientNetwork`], or
    ///   [`CatalogError::Remote`] for other remote failures.
    /// - [`CatalogError::Save`] when the sink rejects the payload.
    pub async fn request_download(&self, record: &DropRecord) -> CatalogResult<SavedFile> {
        let drop_id = record.id();
        if !record.is_released_at(self.store.now()) {
            return Err(CatalogError::ContractViolation {
                operation: "download",
                drop_id: drop_id.clone(),
                reason: "drop is not released yet",
            });
        }
        if !record.available_actions().download {
            let reason = if record.content_type().profile().actions.download {
                "drop has no file attached"
            } else {
                "only document and cheat sheet drops download"
            };
            return Err(CatalogError::ContractViolation {
                operation: "download",
                drop_id: drop_id.clone(),
                reason,
            });
        }

        let _downloading = self.store.begin_download(drop_id);
        self.store.events().send(Event::DownloadStarted {
            drop_id: drop_id.to_string(),
        });

        let payload = match self.service.download(drop_id).await {
            Ok(payload) => payload,
            Err(source) => {
                let error = CatalogError::from_access("download", drop_id, source);
                self.report_failure(record, &error);
                return Err(error);
            }
        };

        let filename = download_filename(record, &payload);
        let saved = match self.sink.save(&filename, &payload).await {
            Ok(saved) => saved,
            Err(source) => {
                let error = CatalogError::Save {
                    drop_id: drop_id.clone(),
                    source,
                };
                self.report_failure(record, &error);
                return Err(error);
            }
        };
        drop(payload);

        tracing::info!(
            drop_id = %drop_id,
            path = %saved.path.display(),
            bytes = saved.bytes,
            "download saved"
        );
        self.store.events().send(Event::DownloadCompleted {
            drop_id: drop_id.to_string(),
            bytes: saved.bytes,
        });
        Ok(saved)
    }

    /// Open a repository drop's external link in an isolated context.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ContractViolation`] for non-repository drops or drops without a link.
    /// - [`CatalogError::AccessDenied`] when the navigation is refused.
    /// - [`CatalogError::OpenFailed`] when the opener fails.
    pub async fn request_external_open(
        &self,
        record: &DropRecord,
    ) -> CatalogResult<ExternalNavigation> {
        let drop_id = record.id();
        if !record.content_type().profile().actions.external_open {
            return Err(CatalogError::ContractViolation {
                operation: "external_open",
                drop_id: drop_id.clone(),
                reason: "only repository drops open external links",
            });
        }
        let Some(url) = record.external_link() else {
            return Err(CatalogError::ContractViolation {
                operation: "external_open",
                drop_id: drop_id.clone(),
                reason: "drop has no external link",
            });
        };

        let navigation = ExternalNavigation::isolated(url.clone());
        match self.opener.open(&navigation).await {
            Ok(()) => {
                tracing::info!(drop_id = %drop_id, url = %navigation.url, "external link opened");
                self.store.events().send(Event::ExternalOpened {
                    drop_id: drop_id.to_string(),
                });
                Ok(navigation)
            }
            Err(OpenError::Denied { message }) => Err(CatalogError::AccessDenied {
                drop_id: drop_id.clone(),
                message,
            }),
            Err(OpenError::Failed { source }) => Err(CatalogError::OpenFailed {
                drop_id: drop_id.clone(),
                source,
            }),
        }
    }

    fn report_failure(&self, record: &DropRecord, error: &CatalogError) {
        tracing::warn!(drop_id = %record.id(), error = %error, "download failed");
        self.store.events().send(Event::DownloadFailed {
            drop_id: record.id().to_string(),
            reason: error.user_message(),
        });
    }
}

/// Local filename for a download: the drop's suggested name, with the
/// extension of the service-provided filename appended when the name lacks it.
#[must_use]
pub fn download_filename(record: &DropRecord, payload: &DownloadPayload) -> String {
    let base = record.suggested_filename();
    let extension = payload
        .filename
        .as_deref()
        .and_then(|name| split_extension(name).1);
    match extension {
        Some(extension)
            if !base
                .to_ascii_lowercase()
                .ends_with(&format!(".{}", extension.to_ascii_lowercase())) =>
        {
            format!("{base}.{extension}")
        }
        _ => base,
    }
}
