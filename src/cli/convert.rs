use super::ui;
use crate::core::asset::{AssetClass, classify};
use crate::core::error::ConvertError;
use crate::core::quote::{ConversionRequest, ConversionResult};
use crate::resolver::Resolver;
use anyhow::{Result, bail};
use comfy_table::Cell;
use futures::future::join_all;
use rust_decimal::Decimal;

const FIAT_DP: u32 = 2;
const CRYPTO_DP: u32 = 8;
const RATE_SIGNIFICANT_DIGITS: u32 = 8;

type Outcome = (String, Result<ConversionResult, ConvertError>);

fn amount_dp(symbol: &str) -> u32 {
    match classify(symbol) {
        Some(AssetClass::Crypto) => CRYPTO_DP,
        _ => FIAT_DP,
    }
}

/// Renders successful conversions as a table.
pub fn display_results(results: &[&ConversionResult]) -> String {
    let Some(first) = results.first() else {
        return String::new();
    };
    let request = &first.request;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Target"),
        ui::header_cell("Rate"),
        ui::header_cell("Amount"),
        ui::header_cell("Provider"),
        ui::header_cell("Fetched At"),
        ui::header_cell("Path"),
    ]);

    for result in results {
        let target = &result.request.target_asset;
        let provider = if result.cached {
            format!("{} (cached)", result.quote.provider())
        } else {
            result.quote.provider()
        };
        table.add_row(vec![
            Cell::new(target),
            ui::significant_cell(result.quote.rate, RATE_SIGNIFICANT_DIGITS),
            ui::amount_cell(result.converted_amount, amount_dp(target)),
            Cell::new(provider),
            Cell::new(result.quote.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")),
            Cell::new(result.path().to_string()),
        ]);
    }

    let mut output = format!(
        "Converting {} {}\n\n",
        ui::style_text(
            &ui::format_decimal(request.amount, amount_dp(&request.source_asset)),
            ui::StyleType::TotalLabel
        ),
        ui::style_text(&request.source_asset, ui::StyleType::Title)
    );
    output.push_str(&table.to_string());

    let skipped: Vec<String> = results
        .iter()
        .flat_map(|r| r.failures.iter())
        .map(ToString::to_string)
        .collect();
    if !skipped.is_empty() {
        output.push_str(&format!(
            "\n\n{}\n{}",
            ui::style_text("Providers skipped:", ui::StyleType::Subtle),
            ui::style_text(&skipped.join("\n"), ui::StyleType::Subtle)
        ));
    }
    output
}

/// Renders a failed conversion, telling bad input apart from unavailable
/// data sources.
pub fn display_error(source: &str, target: &str, error: &ConvertError) -> String {
    if error.is_invalid_input() {
        return format!(
            "{} {source} -> {target}: {error}",
            ui::style_text("Invalid input", ui::StyleType::Error)
        );
    }

    let mut output = format!(
        "{} for {source} -> {target}",
        ui::style_text("All data sources unavailable", ui::StyleType::Error)
    );
    if let ConvertError::Composition { hop, via, .. } = error {
        output.push_str(&format!(" ({hop} via {via})"));
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Provider"), ui::header_cell("Reason")]);
    for attempt in error.attempts() {
        table.add_row(vec![
            Cell::new(&attempt.provider),
            Cell::new(attempt.error.to_string()),
        ]);
    }
    if error.attempts().is_empty() {
        table.add_row(vec![ui::na_cell(true), Cell::new("no provider configured")]);
    }
    output.push_str("\n\n");
    output.push_str(&table.to_string());
    output
}

/// Resolves every target concurrently, prints the outcome and fails if any
/// target could not be converted.
pub async fn run(resolver: &Resolver, amount: Decimal, source: &str, targets: &[String]) -> Result<()> {
    let pb = ui::new_progress_bar(targets.len() as u64, true);
    pb.set_message("Fetching rates...");

    let futures = targets.iter().map(|target| {
        let pb_clone = pb.clone();
        async move {
            let outcome = match ConversionRequest::new(amount, source, target) {
                Ok(request) => resolver.convert(request).await,
                Err(e) => Err(ConvertError::from(e)),
            };
            pb_clone.inc(1);
            (target.clone(), outcome)
        }
    });
    let outcomes: Vec<Outcome> = join_all(futures).await;
    pb.finish_and_clear();

    let converted: Vec<&ConversionResult> = outcomes
        .iter()
        .filter_map(|(_, outcome)| outcome.as_ref().ok())
        .collect();
    if !converted.is_empty() {
        println!("{}", display_results(&converted));
    }

    let mut failed = 0;
    for (target, outcome) in &outcomes {
        if let Err(e) = outcome {
            failed += 1;
            eprintln!("\n{}", display_error(source, target, e));
        }
    }

    if failed > 0 {
        bail!("{} of {} conversions failed", failed, outcomes.len());
    }
    Ok(())
}
