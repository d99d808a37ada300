//! Per-claim confidence scoring.
//!
//! Combines credibility-weighted, freshness-weighted evidence signals with
//! a corroboration boost and a conflict penalty into a 0-100 score.
//! The empty-signal baseline of 25 is a policy constant, not derived.

use chrono::{NaiveDate, Utc};

use super::dates::parse_published_date;
use crate::domain::Credibility;

/// Score for a claim asserted but unverifiable from evidence
pub const EMPTY_SIGNALS_BASELINE: u8 = 25;

/// One evidence signal feeding the scorer
#[derive(Debug, Clone)]
pub struct EvidenceSignal {
    pub credibility: Credibility,
    pub published_date: Option<String>,
}

fn credibility_weight(credibility: Credibility) -> f64 {
    match credibility {
        Credibility::Trusted => 1.0,
        Credibility::Neutral => 0.8,
        Credibility::Unknown => 0.5,
        Credibility::Low => 0.2,
    }
}

/// Freshness weight from days since publication.
///
/// Absent dates weigh 0.8; present-but-unparsable dates weigh 0.75.
fn freshness_weight(published_date: Option<&str>, today: NaiveDate) -> f64 {
    let Some(raw) = published_date else {
        return 0.8;
    };
    let Some(date) = parse_published_date(raw) else {
        return 0.75;
    };

    let days = (today - date).num_days().max(0) as f64;
    if days <= 30.0 {
        1.0 - days / 300.0
    } else if days <= 365.0 {
        0.9 - (days - 30.0) / 1675.0
    } else {
        0.6
    }
}

/// Compute a claim's confidence as of a specific date (for testability)
pub fn compute_claim_confidence_at(
    signals: &[EvidenceSignal],
    corroboration_count: usize,
    has_conflict: bool,
    today: NaiveDate,
) -> u8 {
    if signals.is_empty() {
        return EMPTY_SIGNALS_BASELINE;
    }

    let base: f64 = signals
        .iter()
        .map(|s| {
            credibility_weight(s.credibility) * freshness_weight(s.published_date.as_deref(), today)
        })
        .sum::<f64>()
        / signals.len() as f64;

    // Multiple independent sources increase confidence, capped.
    let corroboration_boost = (0.05 * corroboration_count.saturating_sub(1) as f64).min(0.15);

    // Contradictory evidence reduces confidence.
    let conflict_penalty = if has_conflict { 0.25 } else { 0.0 };

    let score = (base + corroboration_boost - conflict_penalty) * 100.0;
    score.clamp(0.0, 100.0).round() as u8
}

/// Compute a claim's confidence from its evidence signals
pub fn compute_claim_confidence(
    signals: &[EvidenceSignal],
    corroboration_count: usize,
    has_conflict: bool,
) -> u8 {
    compute_claim_confidence_at(signals, corroboration_count, has_conflict, Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn signal(credibility: Credibility, date: Option<&str>) -> EvidenceSignal {
        EvidenceSignal {
            credibility,
            published_date: date.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_signals_hit_baseline() {
        assert_eq!(compute_claim_confidence_at(&[], 5, false, today()), 25);
        assert_eq!(compute_claim_confidence_at(&[], 0, true, today()), 25);
    }

    #[test]
    fn test_fresh_trusted_signal_scores_high() {
        let signals = vec![signal(Credibility::Trusted, Some("2024-06-01"))];
        let score = compute_claim_confidence_at(&signals, 1, false, today());
        assert!((90..=100).contains(&score), "score was {score}");
    }

    #[test]
    fn test_conflict_never_raises_score() {
        let signals = vec![
            signal(Credibility::Trusted, Some("2024-05-20")),
            signal(Credibility::Neutral, None),
        ];
        let without = compute_claim_confidence_at(&signals, 2, false, today());
        let with = compute_claim_confidence_at(&signals, 2, true, today());
        assert!(with <= without);
        assert_eq!(u32::from(without) - u32::from(with), 25);
    }

    #[test]
    fn test_corroboration_boost_capped() {
        let signals = vec![signal(Credibility::Neutral, None)];
        let two = compute_claim_confidence_at(&signals, 2, false, today());
        let many = compute_claim_confidence_at(&signals, 50, false, today());
        // boost is 0.05 at 2 sources, capped at 0.15 no matter how many.
        assert_eq!(two, 69); // (0.8*0.8 + 0.05) * 100
        assert_eq!(many, 79); // (0.8*0.8 + 0.15) * 100
    }

    #[test]
    fn test_freshness_tiers() {
        assert_eq!(freshness_weight(None, today()), 0.8);
        assert_eq!(freshness_weight(Some("not a date"), today()), 0.75);
        assert_eq!(freshness_weight(Some("2024-06-01"), today()), 1.0);
        // 300 days old: 0.9 - 270/1675
        let w = freshness_weight(Some("2023-08-06"), today());
        assert!((w - (0.9 - 270.0 / 1675.0)).abs() < 1e-9);
        // Older than a year.
        assert_eq!(freshness_weight(Some("2020-01-01"), today()), 0.6);
    }

    #[test]
    fn test_low_credibility_old_source_floors_at_zero_side() {
        let signals = vec![signal(Credibility::Low, Some("2019-01-01"))];
        let score = compute_claim_confidence_at(&signals, 1, true, today());
        // (0.2*0.6 + 0 - 0.25) * 100 = -13 → clamped to 0
        assert_eq!(score, 0);
    }

    #[test]
    fn test_output_always_in_range() {
        let signals = vec![
            signal(Credibility::Trusted, Some("2024-06-01")),
            signal(Credibility::Trusted, Some("2024-06-01")),
        ];
        let score = compute_claim_confidence_at(&signals, 10, false, today());
        assert!(score <= 100);
    }
}
