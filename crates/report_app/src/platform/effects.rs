use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use report_core::{Effect, Msg};
use report_engine::{EngineEvent, EngineHandle};
use report_logging::{report_error, report_info, report_warn};

use super::app::AppEvent;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct EffectRunner {
    engine: EngineHandle,
    stop: Arc<AtomicBool>,
    forwarder: Option<JoinHandle<()>>,
}

impl EffectRunner {
    /// Engine events are forwarded to `event_tx` until `shutdown` or until
    /// that channel closes.
    pub fn new(engine: EngineHandle, event_tx: mpsc::Sender<AppEvent>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let forwarder = spawn_event_loop(engine.clone(), Arc::clone(&stop), event_tx);
        Self {
            engine,
            stop,
            forwarder: Some(forwarder),
        }
    }

    /// Joins the forwarding thread and releases both engine handles, which
    /// stops the engine thread and cancels any feed still open.
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(forwarder) = self.forwarder.take() {
            if forwarder.join().is_err() {
                report_error!("Engine event forwarder panicked");
            }
        }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitUpload { upload_id, file } => {
                    report_info!(
                        "SubmitUpload upload_id={} name={} bytes={}",
                        upload_id,
                        file.name,
                        file.bytes.len()
                    );
                    self.engine.submit_upload(upload_id, file);
                }
                Effect::LoadSnapshot { subscription } => self.engine.load_snapshot(subscription),
                Effect::OpenFeed { subscription } => self.engine.open_feed(subscription),
                Effect::CloseFeed { subscription } => self.engine.close_feed(subscription),
                Effect::OpenUrl { url } => {
                    report_info!("OpenUrl {url}");
                    println!("Open: {url}");
                }
            }
        }
    }

}

fn spawn_event_loop(
    engine: EngineHandle,
    stop: Arc<AtomicBool>,
    event_tx: mpsc::Sender<AppEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            let Some(event) = engine.recv_timeout(POLL_INTERVAL) else {
                continue;
            };
            if event_tx.send(AppEvent::Msg(engine_msg(event))).is_err() {
                break;
            }
        }
    })
}

pub fn engine_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::UploadFinished { upload_id, result } => Msg::UploadFinished {
            upload_id,
            result: result.map(|report| report.id).map_err(|err| {
                report_warn!("Upload {upload_id} failed: {err}");
                err.to_string()
            }),
        },
        EngineEvent::SnapshotLoaded {
            subscription,
            result,
        } => Msg::SnapshotLoaded {
            subscription,
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::Change {
            subscription,
            event,
        } => Msg::ChangeReceived {
            subscription,
            event,
        },
        EngineEvent::FeedClosed {
            subscription,
            reason,
        } => Msg::FeedClosed {
            subscription,
            reason,
        },
    }
}
