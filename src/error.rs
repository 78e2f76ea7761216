//! Error type shared by every fallible operation in the crate.

use crate::series::{Period, RunId};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all fallible operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed parameters or data: negative values where non-negative are
    /// required, a probability outside `[0, 1]`, empty required input.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Description of the problem.
        reason: String,
    },

    /// A run (or a standalone series when `run` is `None`) has no values
    /// inside the requested window.
    #[error("{} has no data in {period}", describe_run(.run))]
    InsufficientData {
        /// Offending run, if the input was an ensemble.
        run: Option<RunId>,
        /// Window that came up empty.
        period: Period,
    },

    /// A `statrs` distribution rejected its parameters.
    #[error("{family} construction failed: {message}")]
    Distribution {
        /// Distribution family name.
        family: &'static str,
        /// Message from `statrs`.
        message: String,
    },

    /// I/O failure while reading or writing CSV files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failure.
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV file had a header but no records.
    #[error("CSV file contains no data records")]
    EmptyFile,
}

impl Error {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            reason: reason.into(),
        }
    }
}

fn describe_run(run: &Option<RunId>) -> String {
    match run {
        Some(id) => format!("run {id}"),
        None => "series".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_message() {
        let e = Error::invalid("probability must be in [0, 1], got 1.5");
        assert_eq!(
            e.to_string(),
            "invalid input: probability must be in [0, 1], got 1.5"
        );
    }

    #[test]
    fn insufficient_data_names_run() {
        let e = Error::InsufficientData {
            run: Some(7),
            period: Period::new(2021, 2070).unwrap(),
        };
        assert_eq!(e.to_string(), "run 7 has no data in 2021-2070");
    }

    #[test]
    fn insufficient_data_for_plain_series() {
        let e = Error::InsufficientData {
            run: None,
            period: Period::new(1971, 2020).unwrap(),
        };
        assert_eq!(e.to_string(), "series has no data in 1971-2020");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<Error>();
    }
}
