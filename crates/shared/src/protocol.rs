use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{PositionKey, RecordId};

/// `rel` of the root `Link` header that points at the prediction resource.
pub const PREDICT_LINK_REL: &str = "restconf";
/// `rel` of the root `Link` header that points at the bundled page.
pub const INDEX_LINK_REL: &str = "index";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub words: String,
}

impl PredictRequest {
    pub fn new(words: impl Into<String>) -> Self {
        Self {
            words: words.into(),
        }
    }
}

/// Successful prediction body. Extra fields are tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub confidence: f64,
    pub result: String,
}

/// Serializable view of one query record, for rendering and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub id: RecordId,
    pub position_key: PositionKey,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub confidence: f64,
    pub summary: String,
    pub is_editing: bool,
}
