use crate::{SubscriptionId, UploadFile, UploadId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitUpload { upload_id: UploadId, file: UploadFile },
    LoadSnapshot { subscription: SubscriptionId },
    OpenFeed { subscription: SubscriptionId },
    CloseFeed { subscription: SubscriptionId },
    OpenUrl { url: String },
}
