//! Single-pass folding of extracted events into per-key statistics.

use std::collections::HashMap;

use serde::Serialize;

use crate::events::AuditEvent;

/// Running statistics of routing-failure amounts for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStat {
    pub count: u64,
    /// Sum of every recorded amount, in msat.
    pub total_msat: u64,
    min_msat: Option<u64>,
    max_msat: Option<u64>,
}

impl AggregateStat {
    pub fn record(&mut self, amount_msat: u64) {
        self.count += 1;
        self.total_msat = self.total_msat.saturating_add(amount_msat);
        self.min_msat = Some(self.min_msat.map_or(amount_msat, |min| min.min(amount_msat)));
        self.max_msat = Some(self.max_msat.map_or(amount_msat, |max| max.max(amount_msat)));
    }

    /// Smallest recorded amount; `None` until the first record.
    pub fn min_msat(&self) -> Option<u64> {
        self.min_msat
    }

    pub fn max_msat(&self) -> Option<u64> {
        self.max_msat
    }
}

/// Grouping key for occurrence counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OccurrenceKey {
    pub key: String,
    /// Secondary discriminator, e.g. the dial error text.
    pub detail: Option<String>,
}

impl OccurrenceKey {
    fn of(event: &AuditEvent) -> Self {
        let detail = match event {
            AuditEvent::DialFailure(failure) => Some(failure.error.clone()),
            AuditEvent::RoutingFailure(_) | AuditEvent::PeerConnect(_) => None,
        };
        Self {
            key: event.correlation_key().to_string(),
            detail,
        }
    }
}

/// How events are folded.
pub enum AggregationMode<'a> {
    /// Amount statistics per channel, restricted to attributable channels.
    Stat {
        is_attributable: &'a dyn Fn(&str) -> bool,
    },
    /// Plain counts per key; no attribution filter.
    Occurrence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregation {
    Stats(HashMap<String, AggregateStat>),
    Occurrences(HashMap<OccurrenceKey, u64>),
}

/// Folds `events` into per-key results according to `mode`.
///
/// In stat mode only routing failures whose channel passes `is_attributable`
/// are recorded; everything else is dropped silently.
pub fn aggregate<I>(events: I, mode: AggregationMode<'_>) -> Aggregation
where
    I: IntoIterator<Item = AuditEvent>,
{
    match mode {
        AggregationMode::Stat { is_attributable } => {
            let mut stats: HashMap<String, AggregateStat> = HashMap::new();
            for event in events {
                let AuditEvent::RoutingFailure(failure) = &event else {
                    continue;
                };
                let key = event.correlation_key();
                if !is_attributable(key) {
                    continue;
                }
                stats
                    .entry(key.to_string())
                    .or_default()
                    .record(failure.amount_msat);
            }
            Aggregation::Stats(stats)
        }
        AggregationMode::Occurrence => {
            let mut counts: HashMap<OccurrenceKey, u64> = HashMap::new();
            for event in events {
                *counts.entry(OccurrenceKey::of(&event)).or_insert(0) += 1;
            }
            Aggregation::Occurrences(counts)
        }
    }
}
