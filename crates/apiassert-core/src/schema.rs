//! JSON Schema for the recorded-exchange file format.
//!
//! Tools that capture exchanges for `apiassert validate` can check their
//! output against this schema.

use crate::exchange::RecordedExchange;

/// Generate JSON Schema for [`RecordedExchange`].
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(RecordedExchange);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}
