use serde::Serialize;

/// Body of every bulk send response
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SendResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<SendDetails>,
}

/// Per-batch counts plus the failed recipients, in send order
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SendDetails {
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<FailedSend>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedSend {
    pub recipient: String,
    pub error: String,
}
