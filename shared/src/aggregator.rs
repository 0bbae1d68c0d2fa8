/// Folds per-video outcomes into channel statistics.
///
/// The aggregator is the only consumer of the dispatcher's outcome channel,
/// so the counters need no locking.
use tokio::sync::mpsc;
use tracing::error;

use crate::errors::{RipError, RipResult};
use crate::models::{AcquisitionOutcome, ChannelStats, FailedVideo};

pub struct ResultAggregator {
    stats: ChannelStats,
    received: usize,
}

impl ResultAggregator {
    /// `total` is the number of dispatched videos, fixed before any outcome arrives.
    pub fn new(total: usize) -> Self {
        Self {
            stats: ChannelStats {
                total,
                ..ChannelStats::default()
            },
            received: 0,
        }
    }

    pub fn record(&mut self, outcome: AcquisitionOutcome) {
        self.received += 1;
        if outcome.succeeded {
            self.stats.succeeded += 1;
        } else {
            self.stats.failed += 1;
            self.stats.errors.push(FailedVideo {
                title: outcome.title,
                error: outcome.error.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
    }

    /// Final stats, or an error if outcomes went missing or were duplicated.
    pub fn finish(self) -> RipResult<ChannelStats> {
        if self.received != self.stats.total {
            error!(
                "Outcome count mismatch: dispatched {}, received {}",
                self.stats.total, self.received
            );
            return Err(RipError::OutcomeMismatch {
                dispatched: self.stats.total,
                received: self.received,
            });
        }
        Ok(self.stats)
    }

    /// Drain an outcome channel until every sender is gone.
    pub async fn collect(
        mut self,
        outcomes: &mut mpsc::UnboundedReceiver<AcquisitionOutcome>,
    ) -> RipResult<ChannelStats> {
        while let Some(outcome) = outcomes.recv().await {
            self.record(outcome);
        }
        self.finish()
    }

    /// Fold an already-collected sequence.
    pub fn fold(
        total: usize,
        outcomes: impl IntoIterator<Item = AcquisitionOutcome>,
    ) -> RipResult<ChannelStats> {
        let mut aggregator = Self::new(total);
        for outcome in outcomes {
            aggregator.record(outcome);
        }
        aggregator.finish()
    }
}
