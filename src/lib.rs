//! # anomaly-client
//!
//! Command-line client for a hosted time-series anomaly detection service.
//!
//! A `(timestamp, value)` series is read from a delimited file (or generated),
//! submitted together with the detection parameters, and the scored table plus
//! any plot the service renders are written to disk.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod parameters;
pub mod pipeline;
pub mod scoring;
pub mod table;

pub use error::{Error, Result};
pub use pipeline::{InputSource, Pipeline, RunOutcome};
pub use scoring::{ScoringClient, ScoringService};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::Config("missing service url".to_string());
        assert!(err.to_string().contains("missing service url"));
    }
}
