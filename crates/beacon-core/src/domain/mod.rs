//! Domain model (IDs, requests, outcomes, retry policy, envelopes, resolution state).
//!
//! I/O を持たない型だけを置きます。transport や app はここに依存しますが、
//! 逆方向の依存はありません。

pub mod decision;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod request;
pub mod retry;
pub mod state;
pub mod status;

pub use decision::Decision;
pub use envelope::{ResultEnvelope, StrategyFailure, StrategyKind};
pub use errors::ErrorKind;
pub use ids::{CallbackId, RequestId};
pub use outcome::{AttemptOutcome, OutcomeClass};
pub use request::{LogicalRequest, Operation, ParamValue, parse_endpoint};
pub use retry::{DEFAULT_RETRYABLE_STATUSES, RetryPolicy};
pub use state::{AttemptState, Phase};
pub use status::{StatusBoard, StatusRecord, time_ago};
