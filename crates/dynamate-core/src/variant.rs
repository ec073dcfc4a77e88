//! Backend response types for the filter and preview endpoints.
//!
//! ## Observed shape
//!
//! ### `price` / `compare_at_price`
//! Decimal strings as Shopify returns them (`"29.99"`), with `compare_at_price`
//! explicitly `null` when the variant is not on sale. Some backends send bare
//! JSON numbers instead; both are accepted and kept as text so the evaluator
//! sees exactly what the backend sent.
//!
//! ### Descriptive fields
//! `vendor`, `title`, `sku`, and `size` are display-only and may be `null` or
//! absent on incomplete rows. `quantity` is inventory on hand and can be
//! negative for oversold variants.
//!
//! ### Collection `id`
//! Either a numeric ID or a string (REST vs GraphQL style). Stored as text.

use serde::{Deserialize, Deserializer, Serialize};

use crate::pricing::{evaluate, EvaluationResult, PriceRule, PricingError, RuleParameter};

/// One row of `GET /preview`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default, deserialize_with = "opt_text_or_number")]
    pub variant_id: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(deserialize_with = "text_or_number")]
    pub price: String,
    #[serde(default, deserialize_with = "opt_text_or_number")]
    pub compare_at_price: Option<String>,
}

impl Variant {
    /// Evaluates `rule` against this variant's prices.
    ///
    /// # Errors
    ///
    /// Propagates [`PricingError`] from [`evaluate`].
    pub fn evaluate(
        &self,
        rule: Option<PriceRule>,
        parameter: RuleParameter,
    ) -> Result<EvaluationResult, PricingError> {
        evaluate(
            &self.price,
            self.compare_at_price.as_deref(),
            rule,
            parameter,
        )
    }
}

/// One entry of `GET /collections`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(deserialize_with = "text_or_number")]
    pub id: String,
    pub title: String,
}

/// One row of `POST /simulate`: the variant plus the backend's own verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedVariant {
    #[serde(flatten)]
    pub variant: Variant,
    #[serde(default, deserialize_with = "opt_text_or_number")]
    pub simulated_price: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Int(i64),
    Float(f64),
}

impl TextOrNumber {
    fn into_text(self) -> String {
        match self {
            TextOrNumber::Text(s) => s,
            TextOrNumber::Int(n) => n.to_string(),
            TextOrNumber::Float(n) => n.to_string(),
        }
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    TextOrNumber::deserialize(deserializer).map(TextOrNumber::into_text)
}

fn opt_text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<TextOrNumber>::deserialize(deserializer).map(|v| v.map(TextOrNumber::into_text))
}
