//! Structured failure logging
//!
//! Every failure the scrape swallows is reported through [`log_failure`], which
//! emits one `tracing` event carrying the error class, the variant, the message
//! and a summary of the error's source chain.

use crate::ScrapeError;
use std::error::Error;

/// Renders the chain of underlying causes, outermost first
///
/// Returns an empty string when the error has no source.
pub fn source_chain(err: &dyn Error) -> String {
    let mut causes = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        causes.push(cause.to_string());
        current = cause.source();
    }
    causes.join(" <- ")
}

/// Logs a failure at a severity matching its class
///
/// Timeouts and per-table parse failures are expected on this site and go out
/// as warnings; everything else is an error.
pub fn log_failure(context: &str, err: &ScrapeError) {
    let class = err.class().as_str();
    let kind = err.kind();
    let chain = source_chain(err);

    if err.is_retryable() || matches!(err, ScrapeError::Parse { .. }) {
        tracing::warn!(
            error.class = class,
            error.kind = kind,
            error.chain = %chain,
            "{}: {}",
            context,
            err
        );
    } else {
        tracing::error!(
            error.class = class,
            error.kind = kind,
            error.chain = %chain,
            "{}: {}",
            context,
            err
        );
    }
}
