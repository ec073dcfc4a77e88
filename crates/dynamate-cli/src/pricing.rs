//! Preview, offline evaluation, and backend simulation output.

use chrono::{Local, NaiveDateTime};
use dynamate_client::DynamateClient;
use dynamate_core::preview::{
    format_raw_price, format_schedule_time, EMPTY_CELL, FALLBACK_FOOTNOTE, FALLBACK_MARKER,
};
use dynamate_core::{
    build_preview, count_fallbacks, evaluate, format_price, FilterSelection, PreviewRow,
    PriceRule, RuleParameter, SimulatedVariant, SimulationRequest,
};

use crate::RuleArgs;

/// Fetch the variants for `filter`, evaluate the rule locally for each, and
/// print the before/after table.
///
/// Rows whose prices cannot be parsed show `invalid price` and are logged;
/// they never stop the rest of the table from rendering.
///
/// # Errors
///
/// Returns an error if the backend request fails.
pub(crate) async fn run_preview(
    client: &DynamateClient,
    filter: &FilterSelection,
    rule: &RuleArgs,
    apply_at: Option<NaiveDateTime>,
    revert_at: Option<NaiveDateTime>,
) -> anyhow::Result<()> {
    let variants = client.fetch_preview(filter).await?;

    if variants.is_empty() {
        println!("no variants match {filter}");
        return Ok(());
    }

    let parameter = rule.parameter_or_zero();
    let rows = build_preview(variants, rule.rule, parameter);
    let now = Local::now().naive_local();

    println!("Filter: {filter}");
    println!("Rule:   {}", describe_rule(rule.rule, parameter));
    println!("Apply:  {}", format_schedule_time(apply_at, now));
    println!("Revert: {}", format_schedule_time(revert_at, now));
    println!();
    print_preview_table(&rows);

    for row in &rows {
        if let Err(e) = &row.outcome {
            tracing::warn!(
                sku = row.variant.sku.as_deref().unwrap_or(EMPTY_CELL),
                error = %e,
                "could not evaluate variant prices"
            );
        }
    }

    let fallbacks = count_fallbacks(&rows);
    if fallbacks > 0 {
        println!();
        println!(
            "{FALLBACK_MARKER} {FALLBACK_FOOTNOTE} ({fallbacks} of {} rows)",
            rows.len()
        );
    }

    Ok(())
}

/// Evaluate one price pair without contacting the backend.
///
/// # Errors
///
/// Returns an error if the price or compare-at is not a valid amount.
pub(crate) fn run_evaluate(
    price: &str,
    compare_at: Option<&str>,
    rule: &RuleArgs,
    json: bool,
) -> anyhow::Result<()> {
    let parameter = rule.parameter_or_zero();
    let result = evaluate(price, compare_at, rule.rule, parameter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Rule:        {}", describe_rule(rule.rule, parameter));
    println!("New base:    {}", format_price(result.new_base_price.as_ref()));
    let marker = if result.fallback_used {
        FALLBACK_MARKER
    } else {
        ""
    };
    println!(
        "New compare: {}{marker}",
        format_price(result.new_compare_price.as_ref())
    );
    if result.fallback_used {
        println!();
        println!("{FALLBACK_MARKER} {FALLBACK_FOOTNOTE}");
    }
    Ok(())
}

/// Ask the backend for its own simulation and print it alongside the
/// current prices.
///
/// # Errors
///
/// Returns an error if no rule is given, the rule needs a value and none was
/// given, or the backend request fails.
pub(crate) async fn run_simulate(
    client: &DynamateClient,
    filter: FilterSelection,
    rule: &RuleArgs,
) -> anyhow::Result<()> {
    let request = SimulationRequest::new(filter, rule.rule, rule.value)?;
    let rows = client.simulate(&request).await?;

    if rows.is_empty() {
        println!("no variants match {}", request.filter);
        return Ok(());
    }

    print_simulation_table(&rows);
    Ok(())
}

/// One-line description: label, wire id, and the value when the rule uses one.
pub(crate) fn describe_rule(rule: Option<PriceRule>, parameter: RuleParameter) -> String {
    match rule {
        None => "none (prices unchanged)".to_owned(),
        Some(rule) if !rule.uses_parameter() => format!("{} ({rule})", rule.label()),
        Some(rule) if rule.is_percentage() => {
            format!("{} ({rule}), {parameter}% off", rule.label())
        }
        Some(rule) => format!(
            "{} ({rule}), {} off",
            rule.label(),
            format_price(Some(&parameter.value()))
        ),
    }
}

fn print_preview_table(rows: &[PreviewRow]) {
    println!(
        "{:<16}{:<30}{:<14}{:<7}{:<6}{:<11}{:<12}{:<11}NEW COMPARE",
        "VENDOR", "TITLE", "SKU", "SIZE", "QTY", "PRICE", "COMPARE AT", "NEW BASE"
    );
    for row in rows {
        let v = &row.variant;
        println!(
            "{:<16}{:<30}{:<14}{:<7}{:<6}{:<11}{:<12}{:<11}{}",
            clip(text_or_dash(v.vendor.as_deref()), 15),
            clip(text_or_dash(v.title.as_deref()), 29),
            clip(text_or_dash(v.sku.as_deref()), 13),
            clip(text_or_dash(v.size.as_deref()), 6),
            v.quantity.map_or_else(|| EMPTY_CELL.to_owned(), |q| q.to_string()),
            row.price_cell(),
            row.compare_at_cell(),
            row.new_base_cell(),
            row.new_compare_cell(),
        );
    }
}

fn print_simulation_table(rows: &[SimulatedVariant]) {
    println!(
        "{:<16}{:<30}{:<14}{:<7}{:<11}{:<12}{:<6}{:<11}EXPLANATION",
        "VENDOR", "TITLE", "SKU", "SIZE", "PRICE", "COMPARE AT", "QTY", "SIMULATED"
    );
    for row in rows {
        let v = &row.variant;
        println!(
            "{:<16}{:<30}{:<14}{:<7}{:<11}{:<12}{:<6}{:<11}{}",
            clip(text_or_dash(v.vendor.as_deref()), 15),
            clip(text_or_dash(v.title.as_deref()), 29),
            clip(text_or_dash(v.sku.as_deref()), 13),
            clip(text_or_dash(v.size.as_deref()), 6),
            format_raw_price(Some(&v.price)),
            format_raw_price(v.compare_at_price.as_deref()),
            v.quantity.map_or_else(|| EMPTY_CELL.to_owned(), |q| q.to_string()),
            format_raw_price(row.simulated_price.as_deref()),
            text_or_dash(row.explanation.as_deref()),
        );
    }
}

fn text_or_dash(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => EMPTY_CELL,
    }
}

/// Truncates to `max` characters, marking the cut with `...`.
pub(crate) fn clip(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let keep = max.saturating_sub(3);
        format!("{}...", text.chars().take(keep).collect::<String>())
    } else {
        text.to_owned()
    }
}
