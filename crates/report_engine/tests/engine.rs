use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use chrono::{TimeZone, Utc};
use futures_util::StreamExt;
use report_core::{ChangeEvent, NewReport, Report, ReportId, ReportStatus, UploadFile};
use report_engine::{
    Backend, ChangeFeed, ChangeStream, EngineEvent, EngineHandle, FailureKind, FetchError,
    ObjectStore, RemoteError, ReportTable, SubmitError, UploadStage,
};
use tokio::sync::mpsc as async_mpsc;

const WAIT: Duration = Duration::from_secs(5);

fn report(id: u64, status: ReportStatus) -> Report {
    Report {
        id: ReportId::from(id),
        created_at: Utc.with_ymd_and_hms(2024, 3, id as u32, 0, 0, 0).unwrap(),
        status,
        cse_report: format!("mem://{id}"),
        pl_report: None,
    }
}

fn network(message: &str) -> RemoteError {
    RemoteError {
        kind: FailureKind::Network,
        message: message.to_string(),
    }
}

#[derive(Default)]
struct MemoryStore {
    fail: bool,
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, _bytes: Bytes, _content_type: &str) -> Result<(), RemoteError> {
        if self.fail {
            return Err(network("store down"));
        }
        assert!(key.ends_with(".pdf"));
        Ok(())
    }

    fn public_url(&self, key: &str) -> Result<String, RemoteError> {
        Ok(format!("mem://{key}"))
    }
}

struct MemoryTable {
    rows: Result<Vec<Report>, RemoteError>,
}

#[async_trait::async_trait]
impl ReportTable for MemoryTable {
    async fn insert(&self, new: &NewReport) -> Result<Report, RemoteError> {
        let mut created = report(9, new.status);
        created.cse_report = new.cse_report.clone();
        Ok(created)
    }

    async fn select_all(&self) -> Result<Vec<Report>, RemoteError> {
        self.rows.clone()
    }
}

/// Each subscribe hands out the next scripted channel.
#[derive(Default)]
struct ScriptedFeed {
    streams: Mutex<Vec<async_mpsc::UnboundedReceiver<Result<ChangeEvent, RemoteError>>>>,
    refuse: bool,
}

impl ScriptedFeed {
    fn script(&self) -> async_mpsc::UnboundedSender<Result<ChangeEvent, RemoteError>> {
        let (tx, rx) = async_mpsc::unbounded_channel();
        self.streams.lock().unwrap().push(rx);
        tx
    }
}

#[async_trait::async_trait]
impl ChangeFeed for ScriptedFeed {
    async fn subscribe(&self) -> Result<ChangeStream, RemoteError> {
        if self.refuse {
            return Err(network("feed refused"));
        }
        let rx = self.streams.lock().unwrap().remove(0);
        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(stream.boxed())
    }
}

fn engine(store: MemoryStore, table: MemoryTable, feed: Arc<ScriptedFeed>) -> EngineHandle {
    let backend = Backend::new(Arc::new(store), Arc::new(table), feed);
    EngineHandle::new(backend).expect("engine starts")
}

fn empty_table() -> MemoryTable {
    MemoryTable { rows: Ok(Vec::new()) }
}

#[test]
fn upload_reports_created_row() {
    let handle = engine(MemoryStore::default(), empty_table(), Arc::default());
    let file = UploadFile::new("q1.pdf", "application/pdf", b"%PDF".to_vec());
    handle.submit_upload(3, file);

    match handle.recv_timeout(WAIT) {
        Some(EngineEvent::UploadFinished { upload_id, result }) => {
            assert_eq!(upload_id, 3);
            let created = result.expect("upload ok");
            assert_eq!(created.status, ReportStatus::Pending);
            assert!(created.cse_report.starts_with("mem://"));
            assert!(created.cse_report.ends_with("-q1.pdf"));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn upload_failure_names_stage() {
    let store = MemoryStore { fail: true };
    let handle = engine(store, empty_table(), Arc::default());
    handle.submit_upload(1, UploadFile::new("a.pdf", "application/pdf", vec![1]));

    match handle.recv_timeout(WAIT) {
        Some(EngineEvent::UploadFinished {
            result: Err(SubmitError::Upload(err)),
            ..
        }) => assert_eq!(err.stage, UploadStage::Storage),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn snapshot_results_carry_subscription() {
    let table = MemoryTable {
        rows: Ok(vec![report(2, ReportStatus::Success), report(1, ReportStatus::Error)]),
    };
    let handle = engine(MemoryStore::default(), table, Arc::default());
    handle.load_snapshot(7);

    match handle.recv_timeout(WAIT) {
        Some(EngineEvent::SnapshotLoaded {
            subscription,
            result,
        }) => {
            assert_eq!(subscription, 7);
            assert_eq!(result.unwrap().len(), 2);
        }
        other => panic!("unexpected event {other:?}"),
    }

    let failing = MemoryTable {
        rows: Err(network("offline")),
    };
    let handle = engine(MemoryStore::default(), failing, Arc::default());
    handle.load_snapshot(8);
    assert_eq!(
        handle.recv_timeout(WAIT),
        Some(EngineEvent::SnapshotLoaded {
            subscription: 8,
            result: Err(FetchError(network("offline"))),
        })
    );
}

#[test]
fn feed_forwards_changes_then_reports_end() {
    let feed = Arc::new(ScriptedFeed::default());
    let tx = feed.script();
    let handle = engine(MemoryStore::default(), empty_table(), feed);
    handle.open_feed(4);

    tx.send(Ok(ChangeEvent::Insert(report(1, ReportStatus::Pending))))
        .unwrap();
    tx.send(Err(RemoteError {
        kind: FailureKind::Decode,
        message: "bad line".to_string(),
    }))
    .unwrap();
    tx.send(Ok(ChangeEvent::Delete {
        id: ReportId::from(1),
    }))
    .unwrap();
    tx.send(Err(network("connection reset"))).unwrap();

    assert!(matches!(
        handle.recv_timeout(WAIT),
        Some(EngineEvent::Change { subscription: 4, event: ChangeEvent::Insert(_) })
    ));
    assert!(matches!(
        handle.recv_timeout(WAIT),
        Some(EngineEvent::Change { subscription: 4, event: ChangeEvent::Delete { .. } })
    ));
    match handle.recv_timeout(WAIT) {
        Some(EngineEvent::FeedClosed {
            subscription,
            reason,
        }) => {
            assert_eq!(subscription, 4);
            assert!(reason.unwrap().contains("connection reset"));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn refused_subscription_closes_feed() {
    let feed = Arc::new(ScriptedFeed {
        refuse: true,
        ..ScriptedFeed::default()
    });
    let handle = engine(MemoryStore::default(), empty_table(), feed);
    handle.open_feed(2);

    match handle.recv_timeout(WAIT) {
        Some(EngineEvent::FeedClosed {
            subscription: 2,
            reason: Some(reason),
        }) => assert!(reason.contains("feed refused")),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn closed_feed_goes_quiet() {
    let feed = Arc::new(ScriptedFeed::default());
    let tx = feed.script();
    let handle = engine(MemoryStore::default(), empty_table(), feed);
    handle.open_feed(5);

    tx.send(Ok(ChangeEvent::Insert(report(1, ReportStatus::Pending))))
        .unwrap();
    assert!(matches!(
        handle.recv_timeout(WAIT),
        Some(EngineEvent::Change { subscription: 5, .. })
    ));

    handle.close_feed(5);
    // The feed task drops its receiver once it observes the cancellation.
    let deadline = std::time::Instant::now() + WAIT;
    while !tx.is_closed() {
        assert!(std::time::Instant::now() < deadline, "feed never closed");
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(tx
        .send(Ok(ChangeEvent::Delete {
            id: ReportId::from(1)
        }))
        .is_err());
    assert_eq!(handle.recv_timeout(Duration::from_millis(200)), None);
}

#[test]
fn oversized_payload_ends_feed() {
    let feed = Arc::new(ScriptedFeed::default());
    let tx = feed.script();
    let handle = engine(MemoryStore::default(), empty_table(), feed);
    handle.open_feed(6);

    tx.send(Err(RemoteError {
        kind: FailureKind::Oversized,
        message: "change payload longer than 1048576 bytes".to_string(),
    }))
    .unwrap();

    match handle.recv_timeout(WAIT) {
        Some(EngineEvent::FeedClosed {
            subscription: 6,
            reason: Some(reason),
        }) => assert!(reason.contains("payload too large")),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn dropping_the_last_handle_cancels_open_feeds() {
    let feed = Arc::new(ScriptedFeed::default());
    let tx = feed.script();
    let handle = engine(MemoryStore::default(), empty_table(), feed);
    handle.open_feed(7);
    tx.send(Ok(ChangeEvent::Insert(report(1, ReportStatus::Pending))))
        .unwrap();
    assert!(matches!(
        handle.recv_timeout(WAIT),
        Some(EngineEvent::Change { subscription: 7, .. })
    ));

    drop(handle);
    let deadline = std::time::Instant::now() + WAIT;
    while !tx.is_closed() {
        assert!(std::time::Instant::now() < deadline, "feed outlived the engine");
        std::thread::sleep(Duration::from_millis(10));
    }
}
