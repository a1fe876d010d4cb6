//! Report engine: remote clients, upload submission and effect execution.
mod client;
mod engine;
mod feed;
mod settings;
mod storage;
mod storage_key;
mod submit;
mod table;
mod types;

pub use engine::{Backend, EngineHandle};
pub use feed::{decode_change, ChangeFeed, ChangeStream, ReqwestChangeFeed};
pub use settings::{
    ConfigError, RemoteSettings, DEFAULT_BUCKET, DEFAULT_TABLE, ENV_BUCKET, ENV_KEY, ENV_TABLE,
    ENV_URL,
};
pub use storage::{ObjectStore, ReqwestObjectStore};
pub use storage_key::storage_key;
pub use submit::UploadSubmitter;
pub use table::{ReportTable, ReqwestReportTable};
pub use types::{
    EngineError, EngineEvent, FailureKind, FetchError, RemoteError, SubmitError, UploadError,
    UploadStage,
};
