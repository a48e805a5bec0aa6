use super::ui;
use crate::core::asset::{AssetClass, CRYPTO_ASSETS, FIAT_CURRENCIES};
use crate::providers::ProviderRegistry;
use comfy_table::Cell;

/// Renders the registry as one table per asset class, in failover order.
pub fn display_providers(registry: &ProviderRegistry) -> String {
    let mut sections = Vec::new();
    for class in [AssetClass::Fiat, AssetClass::Crypto] {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("#"),
            ui::header_cell("Provider"),
            ui::header_cell("Priority"),
            ui::header_cell("Credential"),
        ]);

        let mut rows = 0;
        for (position, provider) in registry.providers_for(class).enumerate() {
            let credential = if provider.authenticated {
                Cell::new("configured")
            } else {
                Cell::new("none")
            };
            table.add_row(vec![
                Cell::new(position + 1),
                Cell::new(&provider.name),
                Cell::new(provider.priority),
                credential,
            ]);
            rows += 1;
        }
        if rows == 0 {
            table.add_row(vec![
                ui::na_cell(false),
                Cell::new("no provider"),
                ui::na_cell(false),
                ui::na_cell(false),
            ]);
        }

        let title = format!("{} providers", capitalize(&class.to_string()));
        sections.push(format!(
            "{}\n{}",
            ui::style_text(&title, ui::StyleType::Title),
            table
        ));
    }
    sections.join("\n\n")
}

/// Lists the supported symbols of both asset classes.
pub fn display_assets() -> String {
    let crypto: Vec<&str> = CRYPTO_ASSETS.iter().map(|a| a.symbol).collect();
    format!(
        "{} ({})\n{}\n\n{} ({})\n{}",
        ui::style_text("Fiat", ui::StyleType::Title),
        FIAT_CURRENCIES.len(),
        FIAT_CURRENCIES.join(", "),
        ui::style_text("Crypto", ui::StyleType::Title),
        crypto.len(),
        crypto.join(", ")
    )
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
