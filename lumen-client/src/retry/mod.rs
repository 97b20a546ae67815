//! Rate limiting and retry logic
//!
//! Provides exponential backoff with jitter for remote calls that fail with
//! rate limits (429 / quota) or overloaded servers (503), and turns the final
//! failure into a single classified, user-presentable error.

mod classify;
mod invoker;
mod policy;

pub use classify::{
    ErrorClassifier, ErrorKind, Failure, MessageClassifier, RemoteFailure, StatusCodeClassifier,
    classify_message,
};
pub use invoker::{ClassifiedError, RetryError, RetryingInvoker};
pub use policy::{PolicyError, RetryPolicy};
