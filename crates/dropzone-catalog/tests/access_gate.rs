use std::sync::Arc;

use dropzone_catalog::{Catalog, DirectorySink};
use dropzone_core::{
    CatalogError, ContentType, DownloadPayload, DropId, NavigationIsolation,
};
use dropzone_events::Event;
use dropzone_test_support::effects::{OpenerMode, RecordingOpener, RecordingSink};
use dropzone_test_support::fixtures::{DropFixture, FixedClock};
use dropzone_test_support::mocks::{MockDropService, MockFailure, Operation};

struct Gate {
    service: Arc<MockDropService>,
    sink: Arc<RecordingSink>,
    opener: Arc<RecordingOpener>,
    catalog: Catalog,
}

fn gate_with(sink: RecordingSink, opener: RecordingOpener) -> Gate {
    let service = Arc::new(MockDropService::new());
    let sink = Arc::new(sink);
    let opener = Arc::new(opener);
    let catalog = Catalog::builder(service.clone())
        .clock(Arc::new(FixedClock::at_fixture_now()))
        .build(sink.clone(), opener.clone());
    Gate {
        service,
        sink,
        opener,
        catalog,
    }
}

fn gate() -> Gate {
    gate_with(RecordingSink::new(), RecordingOpener::new())
}

fn pdf(filename: &str) -> DownloadPayload {
    DownloadPayload {
        body: b"%PDF-1.7 guide".to_vec(),
        content_type: Some("application/pdf".into()),
        filename: Some(filename.into()),
    }
}

#[tokio::test]
async fn download_without_file_never_calls_the_service() {
    let gate = gate();
    let record = DropFixture::released("1").no_file().build();

    let err = gate
        .catalog
        .request_download(&record)
        .await
        .expect_err("no file");

    assert!(matches!(
        err,
        CatalogError::ContractViolation {
            reason: "drop has no file attached",
            ..
        }
    ));
    assert_eq!(gate.service.calls(Operation::Download), 0);
    assert!(gate.sink.saved().is_empty());
}

#[tokio::test]
async fn repository_and_other_drops_never_download() {
    let gate = gate();
    let repository = DropFixture::repository("r").file("/media/drops/r.zip").build();
    let other = DropFixture::released("o")
        .content_type(ContentType::Other)
        .build();

    for record in [repository, other] {
        assert!(record.file_present());
        let err = gate
            .catalog
            .request_download(&record)
            .await
            .expect_err("type has no download");
        assert!(matches!(
            err,
            CatalogError::ContractViolation {
                reason: "only document and cheat sheet drops download",
                ..
            }
        ));
    }
    assert_eq!(gate.service.calls(Operation::Download), 0);
    assert!(gate.sink.saved().is_empty());
}

#[tokio::test]
async fn upcoming_drops_cannot_be_downloaded() {
    let gate = gate();
    let record = DropFixture::upcoming("1").build();

    let err = gate
        .catalog
        .request_download(&record)
        .await
        .expect_err("upcoming");

    assert!(err.is_caller_error());
    assert_eq!(gate.service.calls(Operation::Download), 0);
}

#[tokio::test]
async fn download_saves_under_title_with_service_extension() -> anyhow::Result<()> {
    let gate = gate();
    let record = DropFixture::released("1").title("Tokio Internals").build();
    gate.service.set_download(record.id(), Ok(pdf("tokio_internals_ab12.pdf")));
    let mut events = gate.catalog.events().subscribe(None);

    let saved = gate.catalog.request_download(&record).await?;

    assert_eq!(saved.bytes, 14);
    let calls = gate.sink.saved();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].suggested_name, "Tokio Internals.pdf");
    assert_eq!(calls[0].body, b"%PDF-1.7 guide");
    assert!(!gate.catalog.store().is_downloading(record.id()));

    let started = events.next().await.expect("started");
    let completed = events.next().await.expect("completed");
    assert!(matches!(started.event, Event::DownloadStarted { .. }));
    assert!(matches!(completed.event, Event::DownloadCompleted { bytes: 14, .. }));
    Ok(())
}

#[tokio::test]
async fn forbidden_download_is_access_denied_and_clears_indicator() {
    let gate = gate();
    let record = DropFixture::released("1").premium().build();
    gate.service.set_download(
        record.id(),
        Err(MockFailure::Denied(Some("Premium subscription required.".into()))),
    );

    let err = gate
        .catalog
        .request_download(&record)
        .await
        .expect_err("denied");

    assert!(matches!(err, CatalogError::AccessDenied { .. }));
    assert_eq!(err.user_message(), "Premium subscription required.");
    assert!(!gate.catalog.store().is_downloading(record.id()));
    assert!(gate.sink.saved().is_empty());
}

#[tokio::test]
async fn sink_failure_is_reported_as_save_error() {
    let gate = gate_with(RecordingSink::failing(), RecordingOpener::new());
    let record = DropFixture::released("1").build();
    gate.service.set_download(record.id(), Ok(pdf("a.pdf")));

    let err = gate
        .catalog
        .request_download(&record)
        .await
        .expect_err("sink fails");

    assert!(matches!(err, CatalogError::Save { .. }));
    assert!(!gate.catalog.store().is_downloading(record.id()));
}

#[tokio::test]
async fn concurrent_downloads_of_one_drop_run_independently() -> anyhow::Result<()> {
    let gate = gate();
    let record = DropFixture::released("1").build();
    gate.service.set_download(record.id(), Ok(pdf("a.pdf")));
    let hold = gate.service.hold(Operation::Download);

    let spawn = || {
        let catalog = gate.catalog.clone();
        let record = record.clone();
        tokio::spawn(async move { catalog.request_download(&record).await })
    };
    let first = spawn();
    let second = spawn();
    hold.entered().await;
    hold.entered().await;

    assert_eq!(gate.service.calls(Operation::Download), 2);
    assert!(gate.catalog.store().is_downloading(record.id()));

    hold.open();
    first.await??;
    second.await??;
    assert_eq!(gate.sink.saved().len(), 2);
    assert!(!gate.catalog.store().is_downloading(record.id()));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_downloads_into_a_directory_keep_both_files() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let service = Arc::new(MockDropService::new());
    let catalog = Catalog::builder(service.clone())
        .clock(Arc::new(FixedClock::at_fixture_now()))
        .build(
            Arc::new(DirectorySink::new(dir.path())),
            Arc::new(RecordingOpener::new()),
        );
    let record = DropFixture::released("1").build();
    service.set_download(record.id(), Ok(pdf("a.pdf")));
    let hold = service.hold(Operation::Download);

    let spawn = || {
        let catalog = catalog.clone();
        let record = record.clone();
        tokio::spawn(async move { catalog.request_download(&record).await })
    };
    let first = spawn();
    let second = spawn();
    hold.entered().await;
    hold.entered().await;
    hold.open();

    let first = first.await??;
    let second = second.await??;
    assert_ne!(first.path, second.path);
    for saved in [&first, &second] {
        assert_eq!(std::fs::read(&saved.path)?, b"%PDF-1.7 guide");
    }
    let mut names: Vec<String> = std::fs::read_dir(dir.path())?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    names.sort();
    assert_eq!(names, ["Drop 1 (1).pdf", "Drop 1.pdf"]);
    assert!(!catalog.store().is_downloading(record.id()));
    Ok(())
}

#[tokio::test]
async fn cancelled_download_clears_indicator() {
    let gate = gate();
    let record = DropFixture::released("1").build();
    gate.service.set_download(record.id(), Ok(pdf("a.pdf")));
    let hold = gate.service.hold(Operation::Download);

    let catalog = gate.catalog.clone();
    let pending = record.clone();
    let task = tokio::spawn(async move { catalog.request_download(&pending).await });
    hold.entered().await;
    assert!(gate.catalog.store().is_downloading(record.id()));

    task.abort();
    assert!(task.await.is_err());
    assert!(!gate.catalog.store().is_downloading(record.id()));
}

#[tokio::test]
async fn repository_link_opens_in_isolated_context() -> anyhow::Result<()> {
    let gate = gate();
    let record = DropFixture::repository("r1").build();

    let navigation = gate.catalog.request_external_open(&record).await?;

    assert_eq!(navigation.url.as_str(), "https://github.com/dropzone/r1");
    assert_eq!(navigation.isolation, NavigationIsolation::NoOpenerNoReferrer);
    assert_eq!(navigation.isolation.rel(), "noopener noreferrer");
    assert_eq!(gate.opener.opened(), [navigation]);
    Ok(())
}

#[tokio::test]
async fn only_repositories_with_links_open() {
    let gate = gate();
    let document = DropFixture::released("d").github_link("https://github.com/x/y").build();
    let bare_repo = DropFixture::released("r")
        .content_type(ContentType::Repository)
        .build();

    for record in [document, bare_repo] {
        let err = gate
            .catalog
            .request_external_open(&record)
            .await
            .expect_err("not openable");
        assert!(err.is_caller_error());
    }
    assert!(gate.opener.opened().is_empty());
}

#[tokio::test]
async fn opener_denial_and_failure_are_distinguished() {
    let record = DropFixture::repository("r1").build();

    let denied = gate_with(RecordingSink::new(), RecordingOpener::with_mode(OpenerMode::Deny));
    let err = denied
        .catalog
        .request_external_open(&record)
        .await
        .expect_err("denied");
    assert!(matches!(err, CatalogError::AccessDenied { ref drop_id, .. } if *drop_id == DropId::from("r1")));

    let failing = gate_with(RecordingSink::new(), RecordingOpener::with_mode(OpenerMode::Fail));
    let err = failing
        .catalog
        .request_external_open(&record)
        .await
        .expect_err("opener broken");
    assert!(matches!(err, CatalogError::OpenFailed { .. }));
}
