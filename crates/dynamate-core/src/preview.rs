//! Preview rows: each variant paired with its rule evaluation, plus the
//! display formatting shared by every table that shows prices.

use std::str::FromStr;

use chrono::{NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;

use crate::pricing::{round_money, EvaluationResult, PriceRule, PricingError, RuleParameter};
use crate::variant::Variant;

/// Placeholder for absent values.
pub const EMPTY_CELL: &str = "-";

/// Shown instead of a price that failed to parse.
pub const INVALID_CELL: &str = "invalid price";

/// Appended to the compare-at cell of rows whose evaluation used the base
/// price in place of a missing compare-at.
pub const FALLBACK_MARKER: &str = "*";

pub const FALLBACK_FOOTNOTE: &str = "Compare-at price was auto-filled (fallback from base).";

#[derive(Debug, Clone)]
pub struct PreviewRow {
    pub variant: Variant,
    pub outcome: Result<EvaluationResult, PricingError>,
}

impl PreviewRow {
    #[must_use]
    pub fn has_fallback(&self) -> bool {
        matches!(&self.outcome, Ok(r) if r.fallback_used)
    }

    #[must_use]
    pub fn price_cell(&self) -> String {
        format_raw_price(Some(&self.variant.price))
    }

    /// Current compare-at, with [`FALLBACK_MARKER`] when the rule substituted
    /// the base price for it.
    #[must_use]
    pub fn compare_at_cell(&self) -> String {
        let cell = format_raw_price(self.variant.compare_at_price.as_deref());
        if self.has_fallback() {
            format!("{cell}{FALLBACK_MARKER}")
        } else {
            cell
        }
    }

    #[must_use]
    pub fn new_base_cell(&self) -> String {
        match &self.outcome {
            Ok(r) => format_price(r.new_base_price.as_ref()),
            Err(_) => INVALID_CELL.to_owned(),
        }
    }

    #[must_use]
    pub fn new_compare_cell(&self) -> String {
        match &self.outcome {
            Ok(r) => format_price(r.new_compare_price.as_ref()),
            Err(_) => INVALID_CELL.to_owned(),
        }
    }
}

/// Evaluates every variant independently. A bad row keeps its error and
/// does not affect the others.
#[must_use]
pub fn build_preview(
    variants: Vec<Variant>,
    rule: Option<PriceRule>,
    parameter: RuleParameter,
) -> Vec<PreviewRow> {
    variants
        .into_iter()
        .map(|variant| {
            let outcome = variant.evaluate(rule, parameter);
            PreviewRow { variant, outcome }
        })
        .collect()
}

#[must_use]
pub fn count_fallbacks(rows: &[PreviewRow]) -> usize {
    rows.iter().filter(|r| r.has_fallback()).count()
}

/// `$12.30` style currency, `-` when absent. Negative amounts render as
/// `-$2.50`.
#[must_use]
pub fn format_price(amount: Option<&Decimal>) -> String {
    let Some(amount) = amount else {
        return EMPTY_CELL.to_owned();
    };
    let rounded = round_money(*amount);
    if rounded.is_sign_negative() {
        format!("-${}", rounded.abs())
    } else {
        format!("${rounded}")
    }
}

/// Formats a decimal string from the backend. Blank is `-`; text that is
/// not a number is [`INVALID_CELL`], never `$NaN`.
#[must_use]
pub fn format_raw_price(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        None | Some("") => EMPTY_CELL.to_owned(),
        Some(text) if text.contains('_') => INVALID_CELL.to_owned(),
        Some(text) => match Decimal::from_str(text) {
            Ok(amount) => format_price(Some(&amount)),
            Err(_) => INVALID_CELL.to_owned(),
        },
    }
}

/// `Jul 1, 2025 9:00 AM (in 3 days)`, or `-` when unset.
#[must_use]
pub fn format_schedule_time(at: Option<NaiveDateTime>, now: NaiveDateTime) -> String {
    match at {
        Some(at) => format!(
            "{} ({})",
            at.format("%b %-d, %Y %-I:%M %p"),
            describe_distance(at - now)
        ),
        None => EMPTY_CELL.to_owned(),
    }
}

fn describe_distance(delta: TimeDelta) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    const MONTH: u64 = 30 * DAY;
    const YEAR: u64 = 365 * DAY;

    let secs = delta.num_seconds();
    let abs = secs.unsigned_abs();
    let phrase = match abs {
        0..MINUTE => "less than a minute".to_owned(),
        MINUTE..HOUR => plural(abs / MINUTE, "minute"),
        HOUR..DAY => plural(abs / HOUR, "hour"),
        DAY..MONTH => plural(abs / DAY, "day"),
        MONTH..YEAR => plural(abs / MONTH, "month"),
        _ => plural(abs / YEAR, "year"),
    };

    if secs >= 0 {
        format!("in {phrase}")
    } else {
        format!("{phrase} ago")
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::parse_local_datetime;

    fn variant(price: &str, compare: Option<&str>) -> Variant {
        Variant {
            variant_id: None,
            vendor: Some("Nike".to_owned()),
            title: Some("Air Zoom".to_owned()),
            sku: None,
            size: None,
            quantity: Some(1),
            price: price.to_owned(),
            compare_at_price: compare.map(str::to_owned),
        }
    }

    #[test]
    fn bad_row_does_not_poison_the_preview() {
        let rows = build_preview(
            vec![variant("29.99", None), variant("oops", None), variant("10", Some("12"))],
            Some(PriceRule::FixedOfCompare),
            "5".parse().unwrap(),
        );
        assert_eq!(rows.len(), 3);
        assert!(rows[0].outcome.is_ok());
        assert!(rows[1].outcome.is_err());
        assert!(rows[2].outcome.is_ok());
        assert_eq!(rows[1].new_base_cell(), INVALID_CELL);
        assert_eq!(rows[1].price_cell(), INVALID_CELL);
        assert_eq!(count_fallbacks(&rows), 1);
        assert_eq!(rows[2].compare_at_cell(), "$12.00");
        assert_eq!(rows[2].new_base_cell(), "$7.00");
        assert_eq!(rows[2].new_compare_cell(), "$12.00");
    }

    #[test]
    fn fallback_rows_are_marked() {
        let rows = build_preview(
            vec![variant("29.99", None)],
            Some(PriceRule::FixedOfCompare),
            "5".parse().unwrap(),
        );
        assert_eq!(rows[0].compare_at_cell(), "-*");
        assert_eq!(rows[0].new_base_cell(), "$24.99");
        assert_eq!(rows[0].new_compare_cell(), "$29.99");
    }

    #[test]
    fn toggle_without_compare_shows_dash_for_new_base() {
        let rows = build_preview(
            vec![variant("8", None)],
            Some(PriceRule::Toggle),
            RuleParameter::ZERO,
        );
        assert_eq!(rows[0].new_base_cell(), EMPTY_CELL);
        assert_eq!(rows[0].new_compare_cell(), "$8.00");
        assert!(!rows[0].has_fallback());
    }

    #[test]
    fn format_price_variants() {
        assert_eq!(format_price(None), "-");
        assert_eq!(format_price(Some(&Decimal::new(1230, 2))), "$12.30");
        assert_eq!(format_price(Some(&Decimal::new(-25, 1))), "-$2.50");
        assert_eq!(format_raw_price(Some("19.5")), "$19.50");
        assert_eq!(format_raw_price(Some("")), "-");
        assert_eq!(format_raw_price(Some("NaN")), INVALID_CELL);
        assert_eq!(format_raw_price(Some("1_000")), INVALID_CELL);
    }

    #[test]
    fn schedule_time_reads_relative_to_now() {
        let now = parse_local_datetime("2025-07-01T09:00").unwrap();
        let later = parse_local_datetime("2025-07-04T09:00").unwrap();
        let earlier = parse_local_datetime("2025-07-01T07:00").unwrap();
        assert_eq!(
            format_schedule_time(Some(later), now),
            "Jul 4, 2025 9:00 AM (in 3 days)"
        );
        assert_eq!(
            format_schedule_time(Some(earlier), now),
            "Jul 1, 2025 7:00 AM (2 hours ago)"
        );
        assert_eq!(format_schedule_time(None, now), "-");
    }

    #[test]
    fn distance_buckets() {
        assert_eq!(describe_distance(TimeDelta::seconds(30)), "in less than a minute");
        assert_eq!(describe_distance(TimeDelta::minutes(1)), "in 1 minute");
        assert_eq!(describe_distance(TimeDelta::days(-45)), "1 month ago");
    }
}
