use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use futures_util::StreamExt;
use report_core::{SubscriptionId, UploadFile, UploadId};
use report_logging::{report_debug, report_info, report_warn};
use tokio_util::sync::CancellationToken;

use crate::client::build_client;
use crate::{
    ChangeFeed, EngineError, EngineEvent, FailureKind, FetchError, ObjectStore, RemoteError,
    RemoteSettings, ReportTable, ReqwestChangeFeed, ReqwestObjectStore, ReqwestReportTable,
    UploadSubmitter,
};

/// The remote services the engine talks to.
#[derive(Clone)]
pub struct Backend {
    submitter: UploadSubmitter,
    table: Arc<dyn ReportTable>,
    feed: Arc<dyn ChangeFeed>,
}

impl Backend {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        table: Arc<dyn ReportTable>,
        feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self::with_submitter(UploadSubmitter::new(store, table.clone()), table, feed)
    }

    pub fn with_submitter(
        submitter: UploadSubmitter,
        table: Arc<dyn ReportTable>,
        feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self {
            submitter,
            table,
            feed,
        }
    }

    /// Reqwest-backed clients sharing one connection pool.
    pub fn remote(settings: RemoteSettings) -> Result<Self, RemoteError> {
        let client = build_client(&settings)?;
        let settings = Arc::new(settings);
        Ok(Self::new(
            Arc::new(ReqwestObjectStore::new(client.clone(), settings.clone())),
            Arc::new(ReqwestReportTable::new(client.clone(), settings.clone())),
            Arc::new(ReqwestChangeFeed::new(client, settings)),
        ))
    }
}

enum EngineCommand {
    SubmitUpload {
        upload_id: UploadId,
        file: UploadFile,
    },
    LoadSnapshot {
        subscription: SubscriptionId,
    },
    OpenFeed {
        subscription: SubscriptionId,
    },
    CloseFeed {
        subscription: SubscriptionId,
    },
}

/// Runs remote work on a background runtime and reports back as
/// [`EngineEvent`]s. Dropping every handle shuts the runtime down.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(backend: Backend) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("report-engine-worker")
            .enable_all()
            .build()
            .map_err(EngineError::Runtime)?;

        thread::Builder::new()
            .name("report-engine".to_string())
            .spawn(move || run_commands(runtime, backend, cmd_rx, event_tx))
            .map_err(EngineError::Thread)?;

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn submit_upload(&self, upload_id: UploadId, file: UploadFile) {
        self.send(EngineCommand::SubmitUpload { upload_id, file });
    }

    pub fn load_snapshot(&self, subscription: SubscriptionId) {
        self.send(EngineCommand::LoadSnapshot { subscription });
    }

    pub fn open_feed(&self, subscription: SubscriptionId) {
        self.send(EngineCommand::OpenFeed { subscription });
    }

    /// No `Change` or `FeedClosed` event for `subscription` is emitted once
    /// the close has been processed.
    pub fn close_feed(&self, subscription: SubscriptionId) {
        self.send(EngineCommand::CloseFeed { subscription });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            report_warn!("Engine thread is gone; command dropped");
        }
    }
}

fn run_commands(
    runtime: tokio::runtime::Runtime,
    backend: Backend,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let mut feeds: HashMap<SubscriptionId, CancellationToken> = HashMap::new();

    while let Ok(command) = cmd_rx.recv() {
        feeds.retain(|_, token| !token.is_cancelled());
        let event_tx = event_tx.clone();
        match command {
            EngineCommand::SubmitUpload { upload_id, file } => {
                let submitter = backend.submitter.clone();
                runtime.spawn(async move {
                    let result = submitter.submit(file).await;
                    if let Err(err) = &result {
                        report_warn!("Upload {upload_id} failed: {err}");
                    }
                    let _ = event_tx.send(EngineEvent::UploadFinished { upload_id, result });
                });
            }
            EngineCommand::LoadSnapshot { subscription } => {
                let table = backend.table.clone();
                runtime.spawn(async move {
                    let result = table.select_all().await.map_err(FetchError::from);
                    match &result {
                        Ok(rows) => report_debug!("Snapshot {subscription}: {} rows", rows.len()),
                        Err(err) => report_warn!("Snapshot {subscription} failed: {err}"),
                    }
                    let _ = event_tx.send(EngineEvent::SnapshotLoaded {
                        subscription,
                        result,
                    });
                });
            }
            EngineCommand::OpenFeed { subscription } => {
                let token = CancellationToken::new();
                if let Some(previous) = feeds.insert(subscription, token.clone()) {
                    previous.cancel();
                }
                runtime.spawn(run_feed(
                    backend.feed.clone(),
                    subscription,
                    token,
                    event_tx,
                ));
            }
            EngineCommand::CloseFeed { subscription } => {
                if let Some(token) = feeds.remove(&subscription) {
                    report_debug!("Closing change feed {subscription}");
                    token.cancel();
                }
            }
        }
    }

    for token in feeds.values() {
        token.cancel();
    }
    runtime.shutdown_timeout(Duration::from_secs(1));
    report_debug!("Engine thread stopped");
}

async fn run_feed(
    feed: Arc<dyn ChangeFeed>,
    subscription: SubscriptionId,
    token: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let subscribed = tokio::select! {
        biased;
        _ = token.cancelled() => return,
        subscribed = feed.subscribe() => subscribed,
    };
    let mut stream = match subscribed {
        Ok(stream) => stream,
        Err(err) => {
            report_warn!("Change feed {subscription} could not open: {err}");
            finish_feed(&token, &event_tx, subscription, Some(err.to_string()));
            return;
        }
    };
    report_info!("Change feed {subscription} open");

    let reason = loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            next = stream.next() => next,
        };
        match next {
            Some(Ok(event)) => {
                if token.is_cancelled() {
                    return;
                }
                if event_tx
                    .send(EngineEvent::Change {
                        subscription,
                        event,
                    })
                    .is_err()
                {
                    return;
                }
            }
            Some(Err(err)) if err.kind == FailureKind::Decode => {
                report_warn!("Change feed {subscription}: skipping payload: {err}");
            }
            Some(Err(err)) => {
                report_warn!("Change feed {subscription} failed: {err}");
                break Some(err.to_string());
            }
            None => {
                report_info!("Change feed {subscription} ended");
                break None;
            }
        }
    };
    finish_feed(&token, &event_tx, subscription, reason);
}

fn finish_feed(
    token: &CancellationToken,
    event_tx: &mpsc::Sender<EngineEvent>,
    subscription: SubscriptionId,
    reason: Option<String>,
) {
    if !token.is_cancelled() {
        let _ = event_tx.send(EngineEvent::FeedClosed {
            subscription,
            reason,
        });
        token.cancel();
    }
}
