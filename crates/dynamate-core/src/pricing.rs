//! Price rule evaluation.
//!
//! [`evaluate`] is the single implementation of the six price rules. The
//! preview table, offline evaluation, and anything that applies a rule for
//! real all go through it, so a previewed price is the price that gets
//! applied.
//!
//! Money is handled as [`Decimal`]. Rounded outputs use two decimal places,
//! midpoint away from zero, and always carry exactly two fractional digits
//! (`"24.0"` becomes `"24.00"`). Passthrough outputs keep the scale they were
//! given.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which input a [`PricingError::InvalidNumericInput`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Price,
    CompareAtPrice,
    Parameter,
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceField::Price => write!(f, "price"),
            PriceField::CompareAtPrice => write!(f, "compare-at price"),
            PriceField::Parameter => write!(f, "rule parameter"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// A price, compare-at price, or parameter is not a usable number.
    #[error("invalid {field} \"{value}\": {reason}")]
    InvalidNumericInput {
        field: PriceField,
        value: String,
        reason: String,
    },

    /// The rule produced a value outside the representable decimal range.
    #[error("arithmetic overflow while applying {rule}")]
    Overflow { rule: PriceRule },

    #[error("unknown price rule \"{0}\"")]
    UnknownRule(String),
}

/// One of the six bulk price rules.
///
/// Wire identifiers are kebab-case (`"percent-of-compare"`). The identifiers
/// used by the older admin page (`"compare_percentage"` and friends) are
/// accepted as aliases when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceRule {
    /// Swap base and compare-at.
    Toggle,
    /// Base = compare-at minus a percentage; compare-at kept.
    #[serde(alias = "compare_percentage")]
    PercentOfCompare,
    /// Base = compare-at minus a fixed amount; compare-at kept.
    #[serde(alias = "compare_fixed")]
    FixedOfCompare,
    /// Fill an empty compare-at with the base price.
    #[serde(alias = "copy_to_compare")]
    MatchCompareIfEmpty,
    /// Base = base minus a percentage.
    #[serde(alias = "base_percentage")]
    PercentOfBase,
    /// Base = base minus a fixed amount.
    FixedOfBase,
}

impl PriceRule {
    /// All rules in menu order.
    pub const ALL: [PriceRule; 6] = [
        PriceRule::Toggle,
        PriceRule::PercentOfCompare,
        PriceRule::FixedOfCompare,
        PriceRule::MatchCompareIfEmpty,
        PriceRule::PercentOfBase,
        PriceRule::FixedOfBase,
    ];

    /// Wire identifier, e.g. `"fixed-of-base"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PriceRule::Toggle => "toggle",
            PriceRule::PercentOfCompare => "percent-of-compare",
            PriceRule::FixedOfCompare => "fixed-of-compare",
            PriceRule::MatchCompareIfEmpty => "match-compare-if-empty",
            PriceRule::PercentOfBase => "percent-of-base",
            PriceRule::FixedOfBase => "fixed-of-base",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PriceRule::Toggle => "Toggle",
            PriceRule::PercentOfCompare => "% of Compare-at Price",
            PriceRule::FixedOfCompare => "Fixed Off Compare-at Price",
            PriceRule::MatchCompareIfEmpty => "Match Compare-at if Empty",
            PriceRule::PercentOfBase => "% of Base Price",
            PriceRule::FixedOfBase => "Fixed Off Base Price",
        }
    }

    /// Whether the rule reads its [`RuleParameter`]. `toggle` and
    /// `match-compare-if-empty` ignore it.
    #[must_use]
    pub fn uses_parameter(self) -> bool {
        !matches!(self, PriceRule::Toggle | PriceRule::MatchCompareIfEmpty)
    }

    /// Whether the parameter is a percentage (as opposed to a currency amount).
    #[must_use]
    pub fn is_percentage(self) -> bool {
        matches!(self, PriceRule::PercentOfCompare | PriceRule::PercentOfBase)
    }
}

impl fmt::Display for PriceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceRule {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "toggle" => Ok(PriceRule::Toggle),
            "percent-of-compare" | "compare_percentage" => Ok(PriceRule::PercentOfCompare),
            "fixed-of-compare" | "compare_fixed" => Ok(PriceRule::FixedOfCompare),
            "match-compare-if-empty" | "copy_to_compare" => Ok(PriceRule::MatchCompareIfEmpty),
            "percent-of-base" | "base_percentage" => Ok(PriceRule::PercentOfBase),
            "fixed-of-base" => Ok(PriceRule::FixedOfBase),
            other => Err(PricingError::UnknownRule(other.to_owned())),
        }
    }
}

/// The single numeric knob of a rule: percent off for the percentage rules,
/// a currency amount for the fixed rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleParameter(Decimal);

impl RuleParameter {
    pub const ZERO: RuleParameter = RuleParameter(Decimal::ZERO);

    #[must_use]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for RuleParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RuleParameter {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_amount(s, PriceField::Parameter).map(Self)
    }
}

/// Output of one rule evaluation.
///
/// `new_base_price` is `None` only for [`PriceRule::Toggle`] on a variant
/// without a compare-at price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub new_base_price: Option<Decimal>,
    pub new_compare_price: Option<Decimal>,
    /// Compare-at was absent and the base price stood in for it. Callers
    /// must show this to the user.
    pub fallback_used: bool,
}

/// Evaluates `rule` against a variant's decimal-string prices.
///
/// `compare_at_price` that is `None`, empty, or whitespace counts as absent.
/// `rule == None` means no rule (or an unrecognized one) was selected: the
/// base price is rounded and compare-at passes through.
///
/// # Errors
///
/// - [`PricingError::InvalidNumericInput`] if `price` is unparseable or
///   negative, or a non-empty `compare_at_price` is unparseable. A negative
///   compare-at is only rejected by the `*-of-compare` rules, which discount
///   from it; the other rules carry it through.
/// - [`PricingError::Overflow`] if the arithmetic leaves the decimal range.
pub fn evaluate(
    price: &str,
    compare_at_price: Option<&str>,
    rule: Option<PriceRule>,
    parameter: RuleParameter,
) -> Result<EvaluationResult, PricingError> {
    let price = parse_price(price, PriceField::Price)?;
    // Only the discount rules compute from compare-at; the rest carry it through.
    let is_basis = matches!(
        rule,
        Some(PriceRule::PercentOfCompare | PriceRule::FixedOfCompare)
    );
    let compare_at = match compare_at_price.map(str::trim) {
        None | Some("") => None,
        Some(raw) if is_basis => Some(parse_price(raw, PriceField::CompareAtPrice)?),
        Some(raw) => Some(parse_amount(raw, PriceField::CompareAtPrice)?),
    };
    apply_rule(price, compare_at, rule, parameter)
}

/// Applies `rule` to already-parsed prices.
///
/// | Rule | new base | new compare-at | fallback |
/// |---|---|---|---|
/// | `toggle` | compare-at as given | price as given | never |
/// | `percent-of-compare` | basis × (1 − p/100) | basis | compare-at absent, basis = price |
/// | `fixed-of-compare` | basis − p | basis | compare-at absent, basis = price |
/// | `match-compare-if-empty` | price | compare-at, else price | compare-at absent |
/// | `percent-of-base` | price × (1 − p/100) | compare-at as given | never |
/// | `fixed-of-base` | price − p | compare-at as given | never |
/// | none | price | compare-at as given | never |
///
/// A compare-at of zero counts as absent for the two `*-of-compare` rules.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the arithmetic leaves the decimal
/// range.
pub fn apply_rule(
    price: Decimal,
    compare_at: Option<Decimal>,
    rule: Option<PriceRule>,
    parameter: RuleParameter,
) -> Result<EvaluationResult, PricingError> {
    let Some(rule) = rule else {
        return Ok(EvaluationResult {
            new_base_price: Some(round_money(price)),
            new_compare_price: compare_at,
            fallback_used: false,
        });
    };

    let overflow = || PricingError::Overflow { rule };
    let amount = parameter.value();

    let result = match rule {
        PriceRule::Toggle => EvaluationResult {
            new_base_price: compare_at,
            new_compare_price: Some(price),
            fallback_used: false,
        },
        PriceRule::PercentOfCompare | PriceRule::FixedOfCompare => {
            let present = compare_at.filter(|c| !c.is_zero());
            let basis = present.unwrap_or(price);
            let discounted = if rule == PriceRule::PercentOfCompare {
                percent_off(basis, amount).ok_or_else(overflow)?
            } else {
                basis.checked_sub(amount).ok_or_else(overflow)?
            };
            EvaluationResult {
                new_base_price: Some(round_money(discounted)),
                new_compare_price: Some(round_money(basis)),
                fallback_used: present.is_none(),
            }
        }
        PriceRule::MatchCompareIfEmpty => EvaluationResult {
            new_base_price: Some(round_money(price)),
            new_compare_price: Some(round_money(compare_at.unwrap_or(price))),
            fallback_used: compare_at.is_none(),
        },
        PriceRule::PercentOfBase => EvaluationResult {
            new_base_price: Some(round_money(
                percent_off(price, amount).ok_or_else(overflow)?,
            )),
            new_compare_price: compare_at,
            fallback_used: false,
        },
        PriceRule::FixedOfBase => EvaluationResult {
            new_base_price: Some(round_money(
                price.checked_sub(amount).ok_or_else(overflow)?,
            )),
            new_compare_price: compare_at,
            fallback_used: false,
        },
    };

    Ok(result)
}

/// Rounds to cents (midpoint away from zero) and fixes the scale at two.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded
}

/// `basis × (1 − percent / 100)`.
fn percent_off(basis: Decimal, percent: Decimal) -> Option<Decimal> {
    let fraction = percent.checked_div(Decimal::ONE_HUNDRED)?;
    let factor = Decimal::ONE.checked_sub(fraction)?;
    basis.checked_mul(factor)
}

fn parse_price(raw: &str, field: PriceField) -> Result<Decimal, PricingError> {
    let amount = parse_amount(raw, field)?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(PricingError::InvalidNumericInput {
            field,
            value: raw.to_owned(),
            reason: "must not be negative".to_owned(),
        });
    }
    Ok(amount)
}

fn parse_amount(raw: &str, field: PriceField) -> Result<Decimal, PricingError> {
    let trimmed = raw.trim();
    // `Decimal::from_str` skips digit separators; a backend price never has them.
    if trimmed.contains('_') {
        return Err(PricingError::InvalidNumericInput {
            field,
            value: raw.to_owned(),
            reason: "unexpected '_' in number".to_owned(),
        });
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| PricingError::InvalidNumericInput {
            field,
            value: raw.to_owned(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[path = "pricing_test.rs"]
mod tests;
