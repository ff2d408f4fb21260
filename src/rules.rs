//! Generic classification strategies shared by every metric rule
//!
//! Three shapes cover the whole rule table:
//! - range: inclusive `[low, high]`, outside is a warning
//! - upper limit: non-positive means not measured, above the limit is a warning
//! - tiers: ordered half-open intervals, each lower bound inclusive
//! - practice tiers: like tiers, but the first tier holds only zero

use rust_decimal::Decimal;

use crate::catalog::format_clock;
use crate::models::{Band, Evaluation};

/// One half-open interval of a tier table, `[lower, next.lower)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub lower: Decimal,
    pub band: Band,
    pub label: &'static str,
    pub advice: &'static str,

    /// Echo the measured value after the label
    pub show_value: bool,
}

impl Tier {
    pub const fn new(lower: Decimal, band: Band, label: &'static str, advice: &'static str) -> Self {
        Tier {
            lower,
            band,
            label,
            advice,
            show_value: false,
        }
    }

    pub const fn with_value(
        lower: Decimal,
        band: Band,
        label: &'static str,
        advice: &'static str,
    ) -> Self {
        Tier {
            lower,
            band,
            label,
            advice,
            show_value: true,
        }
    }
}

/// How a tier echoes the measured value in its message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDetail {
    Fixed { precision: u32, suffix: &'static str },
    Integer,
    Clock,
}

impl ValueDetail {
    fn render(&self, value: Decimal) -> String {
        match self {
            ValueDetail::Fixed { precision, suffix } => {
                format!("{:.*}{}", *precision as usize, value, suffix)
            }
            ValueDetail::Integer => value.round().to_string(),
            ValueDetail::Clock => format_clock(value),
        }
    }
}

pub const RANGE_LOW: &str = "Bas - Consultez un médecin si persistant";
pub const RANGE_HIGH: &str = "Élevé - Consultez un médecin si persistant";
pub const RANGE_NORMAL: &str = "Normal - Dans les valeurs saines";

pub const LIMIT_UNMEASURED: &str = "Non mesuré";
pub const LIMIT_OK: &str = "Bon - Dans les limites recommandées";
pub const LIMIT_EXCEEDED: &str = "Trop élevé - Essayez de réduire";

/// Two-sided normal range, inclusive on both ends
pub fn range_rule(value: Decimal, low: Decimal, high: Decimal) -> Evaluation {
    if value < low {
        Evaluation::new(Band::Warn, RANGE_LOW)
    } else if value > high {
        Evaluation::new(Band::Warn, RANGE_HIGH)
    } else {
        Evaluation::new(Band::Good, RANGE_NORMAL)
    }
}

/// Intake ceiling; zero or below means nothing was logged
pub fn upper_limit_rule(value: Decimal, limit: Decimal) -> Evaluation {
    if value <= Decimal::ZERO {
        Evaluation::unmeasured(LIMIT_UNMEASURED)
    } else if value <= limit {
        Evaluation::new(Band::Good, LIMIT_OK)
    } else {
        Evaluation::new(Band::Warn, LIMIT_EXCEEDED)
    }
}

/// Find the tier containing `value`
///
/// The match is the last tier whose lower bound is `<= value`. Values below
/// the first lower bound fall in the first tier, so the table is total.
pub fn select_tier(value: Decimal, tiers: &[Tier]) -> Option<&Tier> {
    tiers
        .iter()
        .rev()
        .find(|tier| tier.lower <= value)
        .or_else(|| tiers.first())
}

/// Classify `value` against an ordered tier table
pub fn tier_rule(value: Decimal, tiers: &[Tier], detail: ValueDetail) -> Evaluation {
    match select_tier(value, tiers) {
        Some(tier) => Evaluation::new(tier.band, tier_message(tier, value, detail)),
        None => Evaluation::unmeasured(LIMIT_UNMEASURED),
    }
}

/// Tier table whose first tier means "none at all"
///
/// Any positive amount below the second lower bound is lifted into the
/// second tier, so a short session is never reported as no practice.
pub fn practice_rule(value: Decimal, tiers: &[Tier], detail: ValueDetail) -> Evaluation {
    let selected = match (select_tier(value, tiers), tiers.get(1)) {
        (Some(tier), Some(second)) if value > Decimal::ZERO && tier.lower < second.lower => {
            Some(second)
        }
        (selected, _) => selected,
    };
    match selected {
        Some(tier) => Evaluation::new(tier.band, tier_message(tier, value, detail)),
        None => Evaluation::unmeasured(LIMIT_UNMEASURED),
    }
}

fn tier_message(tier: &Tier, value: Decimal, detail: ValueDetail) -> String {
    if tier.show_value {
        format!("{} ({}) - {}", tier.label, detail.render(value), tier.advice)
    } else {
        format!("{} - {}", tier.label, tier.advice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    static TABLE: [Tier; 3] = [
        Tier::new(dec!(0), Band::Bad, "Bas", "a"),
        Tier::new(dec!(10), Band::Good, "Moyen", "b"),
        Tier::with_value(dec!(20), Band::Warn, "Haut", "c"),
    ];

    #[test]
    fn test_range_rule_is_inclusive() {
        assert_eq!(range_rule(dec!(60), dec!(60), dec!(100)).band, Band::Good);
        assert_eq!(range_rule(dec!(100), dec!(60), dec!(100)).band, Band::Good);
        assert_eq!(range_rule(dec!(59.9), dec!(60), dec!(100)).message, RANGE_LOW);
        assert_eq!(range_rule(dec!(100.1), dec!(60), dec!(100)).message, RANGE_HIGH);
    }

    #[test]
    fn test_upper_limit_rule() {
        assert_eq!(upper_limit_rule(dec!(0), dec!(25)).band, Band::Unmeasured);
        assert_eq!(upper_limit_rule(dec!(-1), dec!(25)).band, Band::Unmeasured);
        assert_eq!(upper_limit_rule(dec!(25), dec!(25)).band, Band::Good);
        assert_eq!(upper_limit_rule(dec!(25.5), dec!(25)).band, Band::Warn);
    }

    #[test]
    fn test_tier_boundaries_belong_to_upper_tier() {
        assert_eq!(select_tier(dec!(9.99), &TABLE).unwrap().label, "Bas");
        assert_eq!(select_tier(dec!(10), &TABLE).unwrap().label, "Moyen");
        assert_eq!(select_tier(dec!(20), &TABLE).unwrap().label, "Haut");
        assert_eq!(select_tier(dec!(1000), &TABLE).unwrap().label, "Haut");
    }

    #[test]
    fn test_values_below_first_tier_use_first_tier() {
        assert_eq!(select_tier(dec!(-5), &TABLE).unwrap().label, "Bas");
        assert!(select_tier(dec!(1), &[]).is_none());
    }

    #[test]
    fn test_practice_rule_reserves_first_tier_for_zero() {
        let detail = ValueDetail::Fixed { precision: 1, suffix: "" };
        assert_eq!(practice_rule(dec!(0), &TABLE, detail).band, Band::Bad);
        assert_eq!(practice_rule(dec!(0.5), &TABLE, detail).message, "Moyen - b");
        assert_eq!(practice_rule(dec!(9.99), &TABLE, detail).band, Band::Good);
        assert_eq!(practice_rule(dec!(25), &TABLE, detail).message, "Haut (25.0) - c");
        assert_eq!(practice_rule(dec!(3), &TABLE[..1], detail).message, "Bas - a");
    }

    #[test]
    fn test_tier_message_echoes_value() {
        let detail = ValueDetail::Fixed { precision: 1, suffix: "h" };
        assert_eq!(tier_rule(dec!(5), &TABLE, detail).message, "Bas - a");
        assert_eq!(tier_rule(dec!(21.04), &TABLE, detail).message, "Haut (21.0h) - c");
        assert_eq!(tier_rule(dec!(21), &TABLE, ValueDetail::Clock).message, "Haut (21:00) - c");
    }
}
