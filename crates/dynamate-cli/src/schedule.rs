//! Schedule submission and immediate revert.

use chrono::{Local, NaiveDateTime};
use dynamate_client::DynamateClient;
use dynamate_core::preview::format_schedule_time;
use dynamate_core::{
    FilterSelection, PriceRule, RevertRequest, RuleParameter, ScheduleError, SchedulePayload,
};

use crate::pricing::describe_rule;

/// Raw `schedule` arguments before validation.
#[derive(Debug)]
pub(crate) struct ScheduleArgs {
    pub filter: FilterSelection,
    pub rule: Option<PriceRule>,
    pub value: Option<RuleParameter>,
    pub title: Option<String>,
    pub apply_at: Option<NaiveDateTime>,
    pub revert_at: Option<NaiveDateTime>,
}

impl ScheduleArgs {
    /// # Errors
    ///
    /// Propagates validation failures from [`SchedulePayload::new`].
    pub(crate) fn into_payload(self) -> Result<SchedulePayload, ScheduleError> {
        SchedulePayload::new(
            self.title.as_deref(),
            self.filter,
            self.rule,
            self.value,
            self.apply_at,
            self.revert_at,
        )
    }
}

/// Print the summary and the exact request body without sending it.
///
/// # Errors
///
/// Returns an error if the payload cannot be serialized.
pub(crate) fn run_dry_run(payload: &SchedulePayload) -> anyhow::Result<()> {
    for line in summary_lines(payload, Local::now().naive_local()) {
        println!("{line}");
    }
    println!();
    println!("dry-run: would POST /apply-schedule with:");
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}

/// Submit the schedule and print the backend's acknowledgement.
///
/// # Errors
///
/// Returns an error if the backend rejects the schedule or is unreachable.
pub(crate) async fn run_schedule(
    client: &DynamateClient,
    payload: &SchedulePayload,
) -> anyhow::Result<()> {
    for line in summary_lines(payload, Local::now().naive_local()) {
        println!("{line}");
    }
    let ack = client.apply_schedule(payload).await?;
    println!();
    println!(
        "{}",
        ack.message
            .as_deref()
            .unwrap_or("Price change scheduled successfully.")
    );
    Ok(())
}

/// # Errors
///
/// Returns an error if the backend rejects the revert or is unreachable.
pub(crate) async fn run_revert(
    client: &DynamateClient,
    filter: FilterSelection,
) -> anyhow::Result<()> {
    let ack = client.revert_now(&RevertRequest::new(filter)).await?;
    println!(
        "{}",
        ack.message.as_deref().unwrap_or("Revert applied successfully.")
    );
    Ok(())
}

/// Human-readable description of what the payload will do.
pub(crate) fn summary_lines(payload: &SchedulePayload, now: NaiveDateTime) -> Vec<String> {
    let mut lines = Vec::with_capacity(5);
    if let Some(title) = &payload.title {
        lines.push(format!("Title:  {title}"));
    }
    lines.push(format!("Filter: {}", payload.filter));
    lines.push(format!(
        "Rule:   {}",
        describe_rule(
            Some(payload.rule_type),
            payload.value_input.unwrap_or(RuleParameter::ZERO)
        )
    ));
    let apply = if payload.apply_now {
        "now".to_owned()
    } else {
        format_schedule_time(payload.apply_date, now)
    };
    lines.push(format!("Apply:  {apply}"));
    let revert = if payload.revert_date.is_some() {
        format_schedule_time(payload.revert_date, now)
    } else {
        "never".to_owned()
    };
    lines.push(format!("Revert: {revert}"));
    lines
}
