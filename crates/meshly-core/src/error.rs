use thiserror::Error;

/// Error type for the collection and aggregation pipeline.
///
/// Remote failures pass through from `meshly-api` untouched so the CLI can
/// still read the HTTP status for its exit code. Parse errors are typed:
/// a malformed dashboard row names the row shape it violated instead of
/// panicking on a missing index.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Remote fetch failure. Fatal to the whole run -- there is no
    /// partial-result mode.
    #[error(transparent)]
    Api(#[from] meshly_api::Error),

    /// A distilled table row did not match its expected shape.
    #[error("malformed {context} row: expected {expected} cells, got {got}")]
    RowShape {
        context: &'static str,
        expected: usize,
        got: usize,
    },

    /// A required cell fragment was missing from a distilled row.
    #[error("malformed {context} row: missing {field}")]
    MissingField {
        context: &'static str,
        field: &'static str,
    },

    /// A cell held a value that failed to parse as its declared type.
    #[error("malformed {context} row: bad {field} value {value:?}")]
    FieldValue {
        context: &'static str,
        field: &'static str,
        value: String,
    },

    /// The checkin-timeline image could not be decoded or analyzed.
    #[error("checkin graph analysis failed: {0}")]
    CheckinGraph(String),
}

impl CoreError {
    /// The remote HTTP status, when this error stems from a rejected fetch.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => e.status(),
            _ => None,
        }
    }
}
