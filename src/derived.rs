//! Metrics computed from event samples rather than read from the platform
//!
//! Every reduction here is commutative over its input, so the order in which
//! the acquisition layer delivers samples never changes a value. The one
//! exception is a tie on the earliest bedtime, which resolves to the first
//! sample in input order.

use chrono::{DateTime, Duration, FixedOffset, Timelike, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{DailyQuantity, Sample, SampleKind, SubjectContext};

/// Grams of protein per kilogram of body mass
pub const DEFAULT_PROTEIN_FACTOR: Decimal = dec!(1.2);

const SECONDS_PER_HOUR: Decimal = dec!(3600);

/// Which derived value backs a catalog metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedKind {
    SleepDuration,
    SleepEfficiency,
    Bedtime,
    Awakenings,
    MindfulMinutes,
    LatestSteps,
}

/// Trailing windows applied to samples before reduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookbackConfig {
    /// Days of sleep samples considered (default: 30)
    pub sleep_days: u32,

    /// Days of mindful sessions considered (default: 7)
    pub mindful_days: u32,

    /// Protein target multiplier in g/kg (default: 1.2)
    pub protein_factor: Decimal,
}

impl Default for LookbackConfig {
    fn default() -> Self {
        LookbackConfig {
            sleep_days: 30,
            mindful_days: 7,
            protein_factor: DEFAULT_PROTEIN_FACTOR,
        }
    }
}

/// Values computed from one snapshot's samples
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub sleep_duration_hours: Decimal,
    pub sleep_efficiency_percent: Decimal,
    pub bedtime: Option<DateTime<FixedOffset>>,
    pub awakenings: u32,
    pub mindful_minutes_per_day: Decimal,
    pub latest_steps: Option<Decimal>,
    pub protein_target_grams: Option<Decimal>,

    /// False when no sleep-related sample fell inside the window
    pub has_sleep_data: bool,
}

impl DerivedMetrics {
    /// Reduce a snapshot's samples
    ///
    /// With `as_of` set, only samples ending inside the trailing windows of
    /// `config` are considered; without it every sample counts.
    pub fn compute(
        samples: &[Sample],
        daily_steps: &[DailyQuantity],
        context: &SubjectContext,
        as_of: Option<DateTime<Utc>>,
        config: &LookbackConfig,
    ) -> Self {
        let inverted = samples.iter().filter(|s| s.duration_seconds().is_none()).count();
        if inverted > 0 {
            warn!(count = inverted, "Ignoring samples that end before they start");
        }

        let sleep: Vec<Sample> = within_window(samples, as_of, config.sleep_days)
            .filter(|s| s.kind.is_sleep_related())
            .cloned()
            .collect();
        let mindful: Vec<Sample> = within_window(samples, as_of, config.mindful_days)
            .filter(|s| s.kind == SampleKind::Mindful)
            .cloned()
            .collect();

        DerivedMetrics {
            sleep_duration_hours: sleep_duration_hours(&sleep),
            sleep_efficiency_percent: sleep_efficiency_percent(&sleep),
            bedtime: bedtime(&sleep),
            awakenings: awakenings_count(&sleep),
            mindful_minutes_per_day: mindful_minutes_per_day(&mindful, config.mindful_days),
            latest_steps: latest_quantity(daily_steps),
            protein_target_grams: protein_target(context.body_mass_kg, config.protein_factor),
            has_sleep_data: sleep.iter().any(|s| s.duration_seconds().is_some()),
        }
    }

    /// Value backing a derived catalog metric, `None` when unavailable
    pub fn value(&self, kind: DerivedKind) -> Option<Decimal> {
        match kind {
            DerivedKind::SleepDuration => self.sleep_value(self.sleep_duration_hours),
            DerivedKind::SleepEfficiency => self.sleep_value(self.sleep_efficiency_percent),
            DerivedKind::Awakenings => self.sleep_value(Decimal::from(self.awakenings)),
            DerivedKind::Bedtime => self.bedtime_hour(),
            DerivedKind::MindfulMinutes => Some(self.mindful_minutes_per_day),
            DerivedKind::LatestSteps => self.latest_steps,
        }
    }

    /// Bedtime as a fractional hour of the subject's local day
    pub fn bedtime_hour(&self) -> Option<Decimal> {
        self.bedtime.map(|start| {
            Decimal::from(start.hour()) + Decimal::from(start.minute()) / dec!(60)
        })
    }

    fn sleep_value(&self, value: Decimal) -> Option<Decimal> {
        self.has_sleep_data.then_some(value)
    }
}

fn within_window(
    samples: &[Sample],
    as_of: Option<DateTime<Utc>>,
    days: u32,
) -> impl Iterator<Item = &Sample> {
    // A window reaching past the calendar's range keeps every sample
    let cutoff = as_of.and_then(|now| {
        Duration::try_days(i64::from(days)).and_then(|window| now.checked_sub_signed(window))
    });
    samples
        .iter()
        .filter(move |s| cutoff.map_or(true, |cutoff| s.end.with_timezone(&Utc) > cutoff))
}

fn total_seconds<'a>(samples: impl Iterator<Item = &'a Sample>) -> i64 {
    samples
        .filter_map(Sample::duration_seconds)
        .fold(0i64, i64::saturating_add)
}

/// Total hours tagged `asleep`
pub fn sleep_duration_hours(samples: &[Sample]) -> Decimal {
    let asleep = total_seconds(samples.iter().filter(|s| s.kind == SampleKind::Asleep));
    Decimal::from(asleep) / SECONDS_PER_HOUR
}

/// Share of time in bed spent asleep, in percent; `0` without any sleep sample
pub fn sleep_efficiency_percent(samples: &[Sample]) -> Decimal {
    let in_bed = total_seconds(samples.iter().filter(|s| s.kind.is_sleep_related()));
    if in_bed == 0 {
        return Decimal::ZERO;
    }
    let asleep = total_seconds(samples.iter().filter(|s| s.kind == SampleKind::Asleep));
    Decimal::from(asleep) * dec!(100) / Decimal::from(in_bed)
}

/// Start of the earliest `asleep` sample
pub fn bedtime(samples: &[Sample]) -> Option<DateTime<FixedOffset>> {
    samples
        .iter()
        .filter(|s| s.kind == SampleKind::Asleep && s.duration_seconds().is_some())
        .min_by_key(|s| s.start)
        .map(|s| s.start)
}

/// Number of `awake` samples
pub fn awakenings_count(samples: &[Sample]) -> u32 {
    let count = samples
        .iter()
        .filter(|s| s.kind == SampleKind::Awake && s.duration_seconds().is_some())
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Average mindful minutes per day over a window of `days`
pub fn mindful_minutes_per_day(samples: &[Sample], days: u32) -> Decimal {
    let seconds = total_seconds(samples.iter().filter(|s| s.kind == SampleKind::Mindful));
    Decimal::from(seconds) / dec!(60) / Decimal::from(days.max(1))
}

/// Daily protein target, unavailable without a positive body mass
pub fn protein_target(body_mass_kg: Option<Decimal>, factor: Decimal) -> Option<Decimal> {
    body_mass_kg
        .filter(|mass| *mass > Decimal::ZERO)
        .and_then(|mass| mass.checked_mul(factor))
}

/// Value of the most recent day in a daily series
pub fn latest_quantity(series: &[DailyQuantity]) -> Option<Decimal> {
    series
        .iter()
        .rev()
        .max_by_key(|quantity| quantity.date)
        .map(|quantity| quantity.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sex;
    use chrono::{NaiveDate, TimeZone};

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, day, hour, minute, 0)
            .unwrap()
    }

    fn night() -> Vec<Sample> {
        vec![
            Sample::new(SampleKind::InBed, at(1, 22, 30), at(1, 23, 0)),
            Sample::new(SampleKind::Asleep, at(1, 23, 0), at(2, 3, 0)),
            Sample::new(SampleKind::Awake, at(2, 3, 0), at(2, 3, 30)),
            Sample::new(SampleKind::Asleep, at(2, 3, 30), at(2, 6, 30)),
        ]
    }

    #[test]
    fn test_sleep_duration_sums_asleep_samples() {
        assert_eq!(sleep_duration_hours(&night()), dec!(7));
    }

    #[test]
    fn test_sleep_efficiency() {
        // 7h asleep out of 8h in bed
        assert_eq!(sleep_efficiency_percent(&night()), dec!(87.5));
        assert_eq!(sleep_efficiency_percent(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_bedtime_and_awakenings() {
        let samples = night();
        assert_eq!(bedtime(&samples), Some(at(1, 23, 0)));
        assert_eq!(awakenings_count(&samples), 1);
        assert_eq!(bedtime(&[]), None);
    }

    #[test]
    fn test_reduction_ignores_sample_order() {
        let mut reversed = night();
        reversed.reverse();
        assert_eq!(sleep_duration_hours(&reversed), sleep_duration_hours(&night()));
        assert_eq!(sleep_efficiency_percent(&reversed), sleep_efficiency_percent(&night()));
        assert_eq!(bedtime(&reversed), bedtime(&night()));
    }

    #[test]
    fn test_protein_target() {
        assert_eq!(protein_target(Some(dec!(70)), DEFAULT_PROTEIN_FACTOR), Some(dec!(84.0)));
        assert_eq!(protein_target(Some(dec!(0)), DEFAULT_PROTEIN_FACTOR), None);
        assert_eq!(protein_target(None, DEFAULT_PROTEIN_FACTOR), None);
        assert_eq!(protein_target(Some(Decimal::MAX), DEFAULT_PROTEIN_FACTOR), None);
    }

    #[test]
    fn test_oversized_window_keeps_every_sample() {
        let config = LookbackConfig {
            sleep_days: u32::MAX,
            mindful_days: u32::MAX,
            ..LookbackConfig::default()
        };
        let as_of = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();

        let derived = DerivedMetrics::compute(
            &night(),
            &[],
            &SubjectContext::default(),
            Some(as_of),
            &config,
        );
        assert!(derived.has_sleep_data);
        assert_eq!(derived.sleep_duration_hours, sleep_duration_hours(&night()));
    }

    #[test]
    fn test_latest_quantity_uses_most_recent_date() {
        let series = vec![
            DailyQuantity { date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(), value: dec!(9000) },
            DailyQuantity { date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), value: dec!(4000) },
        ];
        assert_eq!(latest_quantity(&series), Some(dec!(9000)));
        assert_eq!(latest_quantity(&[]), None);
    }

    #[test]
    fn test_compute_applies_windows() {
        let mut samples = night();
        samples.push(Sample::new(SampleKind::Mindful, at(2, 8, 0), at(2, 8, 35)));
        // Long before the 30-day sleep window
        samples.push(Sample::new(
            SampleKind::Asleep,
            at(1, 1, 0) - Duration::days(60),
            at(1, 5, 0) - Duration::days(60),
        ));

        let context = SubjectContext::new(Sex::Female, Some(dec!(60)));
        let as_of = at(2, 12, 0).with_timezone(&Utc);
        let derived = DerivedMetrics::compute(&samples, &[], &context, Some(as_of), &LookbackConfig::default());

        assert_eq!(derived.sleep_duration_hours, dec!(7));
        assert_eq!(derived.mindful_minutes_per_day, dec!(5));
        assert_eq!(derived.protein_target_grams, Some(dec!(72.0)));
        assert_eq!(derived.bedtime_hour(), Some(dec!(23)));
        assert!(derived.has_sleep_data);
    }

    #[test]
    fn test_sleep_values_unavailable_without_samples() {
        let context = SubjectContext::default();
        let derived = DerivedMetrics::compute(&[], &[], &context, None, &LookbackConfig::default());

        assert!(!derived.has_sleep_data);
        assert_eq!(derived.sleep_efficiency_percent, Decimal::ZERO);
        assert_eq!(derived.value(DerivedKind::SleepDuration), None);
        assert_eq!(derived.value(DerivedKind::Bedtime), None);
        assert_eq!(derived.value(DerivedKind::MindfulMinutes), Some(Decimal::ZERO));
    }
}
