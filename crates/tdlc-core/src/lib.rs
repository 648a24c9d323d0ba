pub mod check;
pub mod counter;
pub mod error;
pub mod report;
pub mod rewrite;
pub mod rules;
pub mod signals;
pub mod util;

pub use check::{CheckRequest, Checker};
pub use error::{CheckError, ConfigError, CounterError, StoreError};
pub use report::model::{CheckResponse, ComplianceReport, Status};
pub use rewrite::rewrite;
pub use rules::catalog::{Channel, RuleSet};
pub use rules::eval::{evaluate, evaluate_for};

pub const TOOL_NAME: &str = "tdlc";

/// JSON schema version of check responses.
/// Bump only when the response shape changes semantically.
pub const SCHEMA_VERSION: &str = "0.1.0";
