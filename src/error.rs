use thiserror::Error;

// ---------------------------------------------------------------------------
// Error taxonomy for user actions (load / plot / export)
// ---------------------------------------------------------------------------

/// Every failure a single user action can produce.
///
/// None of these leave the application unusable: the action is aborted,
/// the user is notified, and the previous dataset / figure stay in place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlotError {
    /// A form field is non-numeric or violates a filter constraint.
    #[error("{0}")]
    InvalidParameter(String),

    /// Plot requested before any CSV was loaded.
    #[error("No data loaded. Please load a CSV file first.")]
    NoDataLoaded,

    /// The CSV could not be parsed or does not follow the column convention.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Writing the figure to disk failed.
    #[error("Export failed: {0}")]
    ExportFailure(String),
}

impl PlotError {
    /// Title shown on the blocking notice for this error.
    pub fn title(&self) -> &'static str {
        match self {
            PlotError::NoDataLoaded => "Warning",
            _ => "Error",
        }
    }

    /// Warnings are shown with a softer style than errors.
    pub fn is_warning(&self) -> bool {
        matches!(self, PlotError::NoDataLoaded)
    }
}
