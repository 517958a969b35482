//! Query list orchestration: validation, prediction calls, and the
//! collection mutations they produce.
//!
//! Every network call runs as an independent task. Completions are applied
//! in whatever order the service answers; nothing is queued or sequenced.

use std::{fmt, sync::Arc};

use shared::{
    domain::{PositionKey, RecordId, RecordLookup},
    protocol::RecordSnapshot,
};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    error::{FailureKind, RequestFailed, ValidationError},
    observable::{Observable, ObservableList},
    prediction::{Prediction, PredictionClient},
    record::QueryRecord,
};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// Input rejected before any request was made. Meant to block the user.
    ValidationFailed { operation: Operation, message: String },
    /// A prediction call failed; input and collection were left untouched.
    RequestFailed {
        operation: Operation,
        text: String,
        kind: FailureKind,
        reason: String,
    },
    RecordAdded { id: RecordId, position: usize },
    RecordRemoved { id: RecordId, position: usize },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerOptions {
    pub lookup: RecordLookup,
}

/// Handle to one in-flight prediction call.
pub struct PendingRequest {
    operation: Operation,
    handle: JoinHandle<Result<Arc<QueryRecord>, RequestFailed>>,
}

impl PendingRequest {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Drops the call. A cancelled request never touches the collection.
    pub fn cancel(&self) {
        debug!(operation = %self.operation, "cancelling prediction request");
        self.handle.abort();
    }

    pub async fn wait(self) -> Result<Arc<QueryRecord>, RequestFailed> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(RequestFailed::Cancelled),
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        }
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("operation", &self.operation)
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[derive(Debug)]
pub enum UpdateOutcome {
    Submitted(PendingRequest),
    /// Empty text routes to a local delete; carries what was removed, if anything.
    Deleted(Option<Arc<QueryRecord>>),
}

pub struct QueryListController {
    client: Arc<dyn PredictionClient>,
    lookup: RecordLookup,
    pub pending_text: Observable<Option<String>>,
    pub records: ObservableList<Arc<QueryRecord>>,
    events: broadcast::Sender<ControllerEvent>,
}

impl QueryListController {
    pub fn new(client: Arc<dyn PredictionClient>, options: ControllerOptions) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            client,
            lookup: options.lookup,
            pending_text: Observable::new(None),
            records: ObservableList::new(),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> Vec<RecordSnapshot> {
        self.records
            .snapshot()
            .iter()
            .map(|record| record.snapshot())
            .collect()
    }

    /// Sends the pending text for prediction and appends the result on success.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit_new(self: &Arc<Self>) -> Result<PendingRequest, ValidationError> {
        let text = match self.pending_text.get() {
            Some(text) if !text.is_empty() => text,
            _ => {
                self.reject(Operation::Create, ValidationError::MissingText);
                return Err(ValidationError::MissingText);
            }
        };

        let controller = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let outcome = controller.client.predict(&text).await;
            controller.complete_create(text, outcome)
        });
        Ok(PendingRequest {
            operation: Operation::Create,
            handle,
        })
    }

    /// Re-predicts an edited record and swaps the result in at the end of the list.
    ///
    /// Empty text is not an error: the record is deleted locally instead.
    pub fn submit_update(self: &Arc<Self>, record: &Arc<QueryRecord>) -> UpdateOutcome {
        let text = record.text.get();
        if text.is_empty() {
            debug!(record_id = %record.id(), "empty update text, deleting record");
            return UpdateOutcome::Deleted(self.delete_record(record));
        }

        let controller = Arc::clone(self);
        let original = Arc::clone(record);
        let handle = tokio::spawn(async move {
            let outcome = controller.client.predict(&text).await;
            controller.complete_update(&original, text, outcome)
        });
        UpdateOutcome::Submitted(PendingRequest {
            operation: Operation::Update,
            handle,
        })
    }

    /// Removes one entry for `record`, located according to the lookup mode.
    ///
    /// With positional lookup this removes whatever currently occupies the
    /// record's stored key, which may be a different record once earlier
    /// rows have been removed. An out-of-range key removes nothing.
    pub fn delete_record(&self, record: &QueryRecord) -> Option<Arc<QueryRecord>> {
        let removed = match self.lookup {
            RecordLookup::Positional => {
                let PositionKey(index) = record.position_key();
                self.records.remove_at(index).map(|item| (index, item))
            }
            RecordLookup::Stable => self.records.remove_first(|item| item.id() == record.id()),
        };

        match removed {
            Some((position, item)) => {
                debug!(record_id = %item.id(), position, lookup = %self.lookup, "record removed");
                self.emit(ControllerEvent::RecordRemoved {
                    id: item.id(),
                    position,
                });
                Some(item)
            }
            None => {
                debug!(
                    record_id = %record.id(),
                    position_key = %record.position_key(),
                    lookup = %self.lookup,
                    "delete matched nothing"
                );
                None
            }
        }
    }

    fn complete_create(
        &self,
        text: String,
        outcome: Result<Prediction, RequestFailed>,
    ) -> Result<Arc<QueryRecord>, RequestFailed> {
        let prediction = self.check_outcome(Operation::Create, &text, outcome)?;
        let record = self.append(text, prediction);
        self.pending_text.set(Some(String::new()));
        Ok(record)
    }

    fn complete_update(
        &self,
        original: &QueryRecord,
        text: String,
        outcome: Result<Prediction, RequestFailed>,
    ) -> Result<Arc<QueryRecord>, RequestFailed> {
        let prediction = self.check_outcome(Operation::Update, &text, outcome)?;
        self.delete_record(original);
        Ok(self.append(text, prediction))
    }

    fn check_outcome(
        &self,
        operation: Operation,
        text: &str,
        outcome: Result<Prediction, RequestFailed>,
    ) -> Result<Prediction, RequestFailed> {
        outcome.map_err(|err| {
            warn!(%operation, error = %err, "prediction request failed");
            self.emit(ControllerEvent::RequestFailed {
                operation,
                text: text.to_string(),
                kind: err.kind(),
                reason: err.to_string(),
            });
            err
        })
    }

    fn append(&self, text: String, prediction: Prediction) -> Arc<QueryRecord> {
        let (position, record) = self.records.push_with(|len| {
            Arc::new(QueryRecord::new(PositionKey(len), text, prediction))
        });
        info!(
            record_id = %record.id(),
            position,
            summary = record.summary(),
            confidence = record.confidence(),
            "record added"
        );
        self.emit(ControllerEvent::RecordAdded {
            id: record.id(),
            position,
        });
        record
    }

    fn reject(&self, operation: Operation, err: ValidationError) {
        info!(%operation, error = %err, "rejected input");
        self.emit(ControllerEvent::ValidationFailed {
            operation,
            message: err.to_string(),
        });
    }

    fn emit(&self, event: ControllerEvent) {
        // No subscribers is fine; the observables carry the state.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
