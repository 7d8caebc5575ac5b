use serde::{Deserialize, Serialize};
use validator::Validate;

use super::model::MessageRecord;

// =============================================================================
// VERIFY
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyMessageRequest {
    #[validate(length(min = 1, message = "Message must not be empty"))]
    pub message: String,
    #[validate(length(min = 1, message = "Signature must not be empty"))]
    pub signature: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyMessageResponse {
    pub success: bool,
    pub status: u16,
    pub valid: bool,
    pub signer: String,
    pub record: MessageResponse,
}

// =============================================================================
// VERIFY BATCH
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyBatchRequest {
    #[validate(length(min = 1, max = 50, message = "Batch size must be between 1 and 50"))]
    pub items: Vec<BatchItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchItem {
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyBatchResponse {
    pub success: bool,
    pub status: u16,
    pub results: Vec<BatchItemResult>,
}

/// Per-item outcome: a recovered signer with its validity, or the recovery
/// error for malformed input (malformed items are not recorded).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// =============================================================================
// HISTORY
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesResponse {
    pub success: bool,
    pub status: u16,
    pub messages: Vec<MessageResponse>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

// =============================================================================
// SHARED SHAPES
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub signature: String,
    pub signer: String,
    pub valid: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<MessageRecord> for MessageResponse {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            message: record.message,
            signature: record.signature,
            signer: record.signer,
            valid: record.valid,
            created_at: record.created_at,
        }
    }
}
