//! Filter option listings and the rule catalogue.

use dynamate_client::DynamateClient;
use dynamate_core::PriceRule;

/// Print every product tag, one per line.
///
/// # Errors
///
/// Returns an error if the backend request fails.
pub(crate) async fn run_tags(client: &DynamateClient) -> anyhow::Result<()> {
    let tags = client.list_tags().await?;

    if tags.is_empty() {
        println!("no tags found");
        return Ok(());
    }

    for tag in &tags {
        println!("{tag}");
    }
    Ok(())
}

/// Print collections as an `ID` / `TITLE` table. The ID is what
/// `--collection` expects.
///
/// # Errors
///
/// Returns an error if the backend request fails.
pub(crate) async fn run_collections(client: &DynamateClient) -> anyhow::Result<()> {
    let collections = client.list_collections().await?;

    if collections.is_empty() {
        println!("no collections found");
        return Ok(());
    }

    let id_width = collections
        .iter()
        .map(|c| c.id.chars().count())
        .max()
        .unwrap_or(0)
        .max(2)
        + 2;
    println!("{:<id_width$}TITLE", "ID");
    for collection in &collections {
        println!("{:<id_width$}{}", collection.id, collection.title);
    }
    Ok(())
}

pub(crate) fn print_rules() {
    println!("{:<24}{:<28}VALUE", "RULE", "DESCRIPTION");
    for rule in PriceRule::ALL {
        println!(
            "{:<24}{:<28}{}",
            rule.as_str(),
            rule.label(),
            value_kind(rule)
        );
    }
}

/// What `--value` means for `rule`.
pub(crate) fn value_kind(rule: PriceRule) -> &'static str {
    if !rule.uses_parameter() {
        "-"
    } else if rule.is_percentage() {
        "percent"
    } else {
        "amount"
    }
}
