//! Hand-off of high-risk customers to a retention workflow.

use crate::error::Result;
use crate::pipeline::{high_risk, PredictionResult};

/// Receives one identifier per flagged customer.
///
/// Delivery, retries and response handling belong to the implementor.
pub trait RetentionNotifier: Send + Sync {
    fn notify(&self, identifier: &str) -> Result<()>;
}

/// Records each hand-off as a `tracing` event.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl RetentionNotifier for LogNotifier {
    fn notify(&self, identifier: &str) -> Result<()> {
        tracing::info!(identifier, "retention workflow notified");
        Ok(())
    }
}

/// Outcome of [`notify_high_risk`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationSummary {
    pub notified: Vec<String>,
    /// High-risk rows without an identifier.
    pub skipped_rows: Vec<usize>,
    /// Identifiers whose notification failed, with the error text.
    pub failed: Vec<(String, String)>,
}

/// Notify every high-risk record that carries an identifier.
///
/// A failing notification is logged and recorded; the remaining records
/// are still handed off.
pub fn notify_high_risk<N: RetentionNotifier + ?Sized>(
    notifier: &N,
    results: &[PredictionResult],
) -> NotificationSummary {
    let mut summary = NotificationSummary::default();
    for result in high_risk(results) {
        let Some(identifier) = result.identifier.as_deref() else {
            summary.skipped_rows.push(result.row);
            continue;
        };
        match notifier.notify(identifier) {
            Ok(()) => summary.notified.push(identifier.to_string()),
            Err(e) => {
                tracing::warn!(identifier, error = %e, "retention notification failed");
                summary.failed.push((identifier.to_string(), e.to_string()));
            }
        }
    }
    summary
}
