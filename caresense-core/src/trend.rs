//! Risk trend derivation.

use crate::types::{HistoryEntry, RiskLevel, RiskTrend};

/// Compare the current risk level against the most recent history entry.
///
/// Pure function. The comparison window is exactly one entry: the retained
/// history is longer only so the UI can show a short strip of prior results.
/// With no usable history the trend is Unknown, never inferred from partial
/// data.
pub fn risk_trend(current: RiskLevel, history: &[HistoryEntry]) -> RiskTrend {
    let Some(previous) = history.first() else {
        return RiskTrend::Unknown;
    };

    match current.ordinal().cmp(&previous.risk_level.ordinal()) {
        std::cmp::Ordering::Less => RiskTrend::Improving,
        std::cmp::Ordering::Greater => RiskTrend::Worsening,
        std::cmp::Ordering::Equal => RiskTrend::Unchanged,
    }
}
