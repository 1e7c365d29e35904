//! Command execution results and in-band error detection.

use serde::Serialize;

/// Result of one CLI command round-trip. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    /// Whether the round-trip completed and the device did not report an
    /// in-band error.
    pub success: bool,

    /// Captured output with the command echo stripped.
    pub output: String,

    /// Failure message when `success` is false.
    pub error: Option<String>,
}

impl CommandResult {
    /// A successful round-trip.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    /// A failed round-trip with no usable output.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// A round-trip that completed at the transport level but carried
    /// device error text in its output.
    pub fn rejected(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            error: Some(error.into()),
        }
    }
}

/// Error keywords the CLI prints while still returning a clean prompt.
///
/// The device's exit status is orthogonal to business success; these
/// markers are the only signal that a command was refused.
const ERROR_MARKERS: [&str; 6] = [
    "error",
    "invalid",
    "failed",
    "not found",
    "does not exist",
    "unknown command",
];

/// Case-insensitive scan for in-band device error text.
pub fn contains_error_text(output: &str) -> bool {
    let lower = output.to_lowercase();
    ERROR_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_markers_case_insensitive() {
        assert!(contains_error_text("%Error: ONU does not exist"));
        assert!(contains_error_text("Invalid input detected"));
        assert!(contains_error_text("Command FAILED"));
        assert!(contains_error_text("Unknown command"));
    }

    #[test]
    fn test_clean_output_passes() {
        assert!(!contains_error_text("OnuIndex        Sn              State"));
        assert!(!contains_error_text(""));
        assert!(!contains_error_text("gpon-onu_1/1/1:1    ZTEGC1234567    initial"));
    }

    #[test]
    fn test_result_constructors() {
        let ok = CommandResult::ok("output");
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed = CommandResult::failed("boom");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert!(failed.output.is_empty());

        let rejected = CommandResult::rejected("%Error", "device reported an error");
        assert!(!rejected.success);
        assert_eq!(rejected.output, "%Error");
    }
}
