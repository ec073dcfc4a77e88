//! Filter selection and the request bodies sent to the scheduling backend.
//!
//! The backend expects camelCase JSON with the filter flattened into
//! `filterType` / `filterValue`, the rule parameter as a JSON number, and
//! dates in the browser's `datetime-local` form (`2025-07-01T09:00`).

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::pricing::{PriceRule, RuleParameter};

/// Wire format for apply/revert dates.
pub const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("select a tag or a collection")]
    MissingFilter,

    #[error("select a price rule")]
    MissingRule,

    #[error("rule {rule} needs a value")]
    MissingParameter { rule: PriceRule },

    #[error("revert date {revert_at} must be after apply date {apply_at}")]
    RevertBeforeApply {
        apply_at: NaiveDateTime,
        revert_at: NaiveDateTime,
    },

    #[error("invalid date \"{value}\": {reason}")]
    InvalidDateTime { value: String, reason: String },
}

/// Which variants a preview or schedule targets. Exactly one filter is
/// active at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSelection {
    Tag(String),
    /// Collection ID (not title).
    Collection(String),
}

impl FilterSelection {
    /// Builds a selection from optional form values. A non-empty tag wins
    /// over a collection.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::MissingFilter`] when neither value is set.
    pub fn from_parts(tag: Option<&str>, collection: Option<&str>) -> Result<Self, ScheduleError> {
        fn non_empty(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|s| !s.is_empty())
        }

        if let Some(tag) = non_empty(tag) {
            return Ok(FilterSelection::Tag(tag.to_owned()));
        }
        if let Some(id) = non_empty(collection) {
            return Ok(FilterSelection::Collection(id.to_owned()));
        }
        Err(ScheduleError::MissingFilter)
    }

    #[must_use]
    pub fn filter_type(&self) -> &'static str {
        match self {
            FilterSelection::Tag(_) => "tag",
            FilterSelection::Collection(_) => "collection",
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            FilterSelection::Tag(v) | FilterSelection::Collection(v) => v,
        }
    }

    /// Query parameter for `GET /preview`.
    #[must_use]
    pub fn query_pair(&self) -> (&'static str, &str) {
        match self {
            FilterSelection::Tag(v) => ("tag", v),
            FilterSelection::Collection(v) => ("collectionId", v),
        }
    }
}

impl std::fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} \"{}\"", self.filter_type(), self.value())
    }
}

impl Serialize for FilterSelection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("FilterSelection", 2)?;
        state.serialize_field("filterType", self.filter_type())?;
        state.serialize_field("filterValue", self.value())?;
        state.end()
    }
}

/// Body of `POST /apply-schedule`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub filter: FilterSelection,
    pub rule_type: PriceRule,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_parameter"
    )]
    pub value_input: Option<RuleParameter>,
    /// `true` exactly when no apply date was given.
    pub apply_now: bool,
    #[serde(serialize_with = "serialize_local_datetime")]
    pub apply_date: Option<NaiveDateTime>,
    #[serde(serialize_with = "serialize_local_datetime")]
    pub revert_date: Option<NaiveDateTime>,
}

impl SchedulePayload {
    /// Validates and assembles a schedule request.
    ///
    /// The parameter is dropped for rules that ignore it, and a blank title
    /// is treated as absent.
    ///
    /// # Errors
    ///
    /// - [`ScheduleError::MissingRule`] if `rule` is `None`.
    /// - [`ScheduleError::MissingParameter`] if the rule needs a value and
    ///   none was given.
    /// - [`ScheduleError::RevertBeforeApply`] if both dates are set and the
    ///   revert date is not after the apply date.
    pub fn new(
        title: Option<&str>,
        filter: FilterSelection,
        rule: Option<PriceRule>,
        parameter: Option<RuleParameter>,
        apply_at: Option<NaiveDateTime>,
        revert_at: Option<NaiveDateTime>,
    ) -> Result<Self, ScheduleError> {
        let (rule, parameter) = require_rule(rule, parameter)?;

        if let (Some(apply_at), Some(revert_at)) = (apply_at, revert_at) {
            if revert_at <= apply_at {
                return Err(ScheduleError::RevertBeforeApply {
                    apply_at,
                    revert_at,
                });
            }
        }

        Ok(Self {
            title: title
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned),
            filter,
            rule_type: rule,
            value_input: parameter,
            apply_now: apply_at.is_none(),
            apply_date: apply_at,
            revert_date: revert_at,
        })
    }
}

/// Body of `POST /simulate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    #[serde(flatten)]
    pub filter: FilterSelection,
    pub rule_type: PriceRule,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_parameter"
    )]
    pub discount_value: Option<RuleParameter>,
}

impl SimulationRequest {
    /// # Errors
    ///
    /// Same rule and parameter checks as [`SchedulePayload::new`].
    pub fn new(
        filter: FilterSelection,
        rule: Option<PriceRule>,
        parameter: Option<RuleParameter>,
    ) -> Result<Self, ScheduleError> {
        let (rule, parameter) = require_rule(rule, parameter)?;
        Ok(Self {
            filter,
            rule_type: rule,
            discount_value: parameter,
        })
    }
}

/// Body of `POST /revert-now`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevertRequest {
    #[serde(flatten)]
    pub filter: FilterSelection,
}

impl RevertRequest {
    #[must_use]
    pub fn new(filter: FilterSelection) -> Self {
        Self { filter }
    }
}

/// Parses a `datetime-local` value, with or without seconds.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidDateTime`] if neither form matches.
pub fn parse_local_datetime(raw: &str) -> Result<NaiveDateTime, ScheduleError> {
    let trimmed = raw.trim();
    NaiveDateTime::parse_from_str(trimmed, LOCAL_DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| ScheduleError::InvalidDateTime {
            value: raw.to_owned(),
            reason: e.to_string(),
        })
}

fn require_rule(
    rule: Option<PriceRule>,
    parameter: Option<RuleParameter>,
) -> Result<(PriceRule, Option<RuleParameter>), ScheduleError> {
    let rule = rule.ok_or(ScheduleError::MissingRule)?;
    if !rule.uses_parameter() {
        return Ok((rule, None));
    }
    match parameter {
        Some(p) => Ok((rule, Some(p))),
        None => Err(ScheduleError::MissingParameter { rule }),
    }
}

#[allow(clippy::ref_option)]
fn serialize_parameter<S>(value: &Option<RuleParameter>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let decimal: Option<Decimal> = value.map(RuleParameter::value);
    rust_decimal::serde::float_option::serialize(&decimal, serializer)
}

#[allow(clippy::ref_option)]
fn serialize_local_datetime<S>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(dt) => serializer.serialize_some(&dt.format(LOCAL_DATETIME_FORMAT).to_string()),
        None => serializer.serialize_none(),
    }
}
