use chrono::{DateTime, Utc};
use shared::{
    domain::{PositionKey, RecordId},
    protocol::RecordSnapshot,
};

use crate::{observable::Observable, prediction::Prediction};

/// One submitted query and the latest prediction the service returned for it.
///
/// Passive by intent: the controller owns every transition except the
/// user-driven `text` and `is_editing` cells.
#[derive(Debug)]
pub struct QueryRecord {
    id: RecordId,
    position_key: PositionKey,
    created_at: DateTime<Utc>,
    confidence: f64,
    summary: String,
    pub text: Observable<String>,
    pub is_editing: Observable<bool>,
}

impl QueryRecord {
    pub fn new(position_key: PositionKey, text: impl Into<String>, prediction: Prediction) -> Self {
        Self::with_created_at(position_key, text, Utc::now(), prediction)
    }

    pub fn with_created_at(
        position_key: PositionKey,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
        prediction: Prediction,
    ) -> Self {
        Self {
            id: RecordId::new(),
            position_key,
            created_at,
            confidence: prediction.confidence,
            summary: prediction.summary,
            text: Observable::new(text.into()),
            is_editing: Observable::new(false),
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn position_key(&self) -> PositionKey {
        self.position_key
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn begin_edit(&self) {
        self.is_editing.set(true);
    }

    pub fn end_edit(&self) {
        self.is_editing.set(false);
    }

    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            id: self.id,
            position_key: self.position_key,
            text: self.text.get(),
            created_at: self.created_at,
            confidence: self.confidence,
            summary: self.summary.clone(),
            is_editing: self.is_editing.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn sample() -> QueryRecord {
        QueryRecord::new(
            PositionKey(3),
            "invoice 4431",
            Prediction {
                confidence: 0.75,
                summary: "BILL".into(),
            },
        )
    }

    #[test]
    fn begin_edit_is_idempotent() {
        let record = sample();
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        record.is_editing.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        record.begin_edit();
        record.begin_edit();

        assert!(record.is_editing.get());
        assert_eq!(notified.load(Ordering::SeqCst), 2);
        assert_eq!(record.text.get(), "invoice 4431");
    }

    #[test]
    fn snapshot_reflects_current_cells() {
        let record = sample();
        record.text.set("invoice 4432".into());
        record.begin_edit();

        let snapshot = record.snapshot();
        assert_eq!(snapshot.id, record.id());
        assert_eq!(snapshot.position_key, PositionKey(3));
        assert_eq!(snapshot.text, "invoice 4432");
        assert_eq!(snapshot.summary, "BILL");
        assert!(snapshot.is_editing);

        record.end_edit();
        assert!(!record.snapshot().is_editing);
    }
}
