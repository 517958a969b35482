//! Client-side core for submitting text to a prediction service and keeping
//! an observable list of the results.

pub mod controller;
pub mod discovery;
pub mod error;
pub mod observable;
pub mod prediction;
pub mod record;

pub use controller::{
    ControllerEvent, ControllerOptions, Operation, PendingRequest, QueryListController,
    UpdateOutcome,
};
pub use discovery::ServiceLinks;
pub use error::{FailureKind, RequestFailed, ValidationError};
pub use observable::{ListChange, Observable, ObservableList, SubscriptionId};
pub use prediction::{HttpPredictionClient, Prediction, PredictionClient, DEFAULT_PREDICT_URL};
pub use record::QueryRecord;
