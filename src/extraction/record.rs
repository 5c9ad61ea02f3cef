use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Human-readable labels for the three required fields, in schema order.
pub const FIRST_NAME_LABEL: &str = "First Name";
pub const LAST_NAME_LABEL: &str = "Last Name";
pub const SUMMARY_LABEL: &str = "Summary";

/// Structured record extracted from an encounter transcript.
///
/// Each field is independently present or absent; which fields are missing
/// is derived via `missing_fields`, never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl EncounterRecord {
    /// Assemble a record from the function-call arguments object.
    ///
    /// Anything other than a JSON object (malformed arguments, non-object
    /// values) yields an all-absent record rather than an error. Fields
    /// that are missing, non-string, or empty are treated as absent.
    pub fn from_arguments(arguments: &Value) -> Self {
        Self {
            first_name: string_field(arguments, "firstName"),
            last_name: string_field(arguments, "lastName"),
            summary: string_field(arguments, "summary"),
        }
    }

    /// Labels of the required fields that are absent, in schema order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();

        if self.first_name.is_none() {
            missing.push(FIRST_NAME_LABEL);
        }
        if self.last_name.is_none() {
            missing.push(LAST_NAME_LABEL);
        }
        if self.summary.is_none() {
            missing.push(SUMMARY_LABEL);
        }

        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

fn string_field(arguments: &Value, key: &str) -> Option<String> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Three-way verdict for one extraction attempt.
///
/// `Partial` means the service responded but one or more fields could not
/// be determined; `Failed` means no usable response was obtained at all.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// All three fields present
    Complete(EncounterRecord),
    /// Service responded with incomplete data; the caller can still edit
    /// the partial record or prompt for the missing fields
    Partial {
        record: EncounterRecord,
        missing_fields: Vec<&'static str>,
    },
    /// Transport or service failure; no fields were obtained
    Failed { reason: String },
}
