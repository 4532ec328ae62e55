use super::ui;
use crate::core::quote::QuoteSource;
use crate::core::snapshot::PriceSnapshot;
use crate::service::PriceService;
use anyhow::{Context, Result};
use comfy_table::Cell;
use std::time::Duration;
use tracing::info;

impl PriceSnapshot {
    pub fn display_as_table(&self) -> String {
        let currency = &self.target_currency;
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Commodity"),
            ui::header_cell("USD"),
            ui::header_cell(currency),
            ui::header_cell("USD / oz"),
            ui::header_cell("Change"),
        ]);

        for (name, metal) in [("Gold (g)", &self.gold), ("Silver (g)", &self.silver)] {
            table.add_row(vec![
                Cell::new(name),
                ui::amount_cell(format!("{:.3}", metal.gram_usd)),
                ui::amount_cell(ui::format_thousands(metal.gram_idr)),
                ui::amount_cell(format!("{:.2}", metal.ounce_usd)),
                ui::change_cell(metal.change_pct),
            ]);
        }
        table.add_row(vec![
            Cell::new("Oil (bbl)"),
            ui::amount_cell(format!("{:.2}", self.oil.usd)),
            ui::amount_cell(ui::format_thousands(self.oil.idr)),
            ui::amount_cell("-".to_string()),
            ui::change_cell(self.oil.change_pct),
        ]);

        let source_style = match self.source {
            QuoteSource::Live => ui::StyleType::Live,
            QuoteSource::Mock => ui::StyleType::Warning,
        };

        let mut output = format!(
            "{}\n\n",
            ui::style_text("Commodity Prices", ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{} 1 USD = {} {}",
            ui::style_text("Rate:", ui::StyleType::Label),
            ui::format_thousands(self.usd_to_target_rate.round() as i64),
            currency
        ));
        output.push_str(&format!(
            "\n{} {} ({})",
            ui::style_text("Source:", ui::StyleType::Label),
            ui::style_text(&self.source.to_string(), source_style),
            self.method
        ));
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!(
                    "Updated {}",
                    self.last_update
                        .with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M:%S")
                ),
                ui::StyleType::Subtle
            )
        ));
        output
    }
}

/// Runs one refresh cycle and prints the result.
pub async fn fetch(service: &PriceService, json: bool) -> Result<()> {
    let pb = ui::new_spinner("Fetching prices...");
    let snapshot = service.refresh().await;
    pb.finish_and_clear();

    if json {
        let body = serde_json::to_string_pretty(snapshot.as_ref())
            .context("Failed to serialize snapshot")?;
        println!("{body}");
    } else {
        println!("{}", snapshot.display_as_table());
    }
    Ok(())
}

/// Keeps refreshing on `interval` and reprints on every cache replacement
/// until Ctrl-C.
pub async fn watch(service: &PriceService, interval: Duration) -> Result<()> {
    let mut updates = service.cache().subscribe();

    let pb = ui::new_spinner("Fetching prices...");
    let first = service.start(interval).await;
    pb.finish_and_clear();
    println!("{}", first.display_as_table());
    updates.mark_unchanged();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                changed.context("Price cache closed")?;
                let snapshot = updates.borrow_and_update().snapshot.clone();
                ui::print_separator();
                println!("{}", snapshot.display_as_table());
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Shutting down");
                service.stop();
                return Ok(());
            }
        }
    }
}

/// Runs the readiness cycle, then prints the liveness probe.
pub async fn health(service: &PriceService) -> Result<()> {
    service.refresh().await;
    let body =
        serde_json::to_string_pretty(&service.health()).context("Failed to serialize health")?;
    println!("{body}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shows_all_commodities() {
        let snapshot = PriceSnapshot::seed(15500.0, "IDR").unwrap();
        let output = console::strip_ansi_codes(&snapshot.display_as_table()).to_string();

        assert!(output.contains("Gold (g)"));
        assert!(output.contains("Silver (g)"));
        assert!(output.contains("Oil (bbl)"));
        assert!(output.contains("62.710"));
        assert!(output.contains("972.005"));
        assert!(output.contains("1 USD = 15.500 IDR"));
        assert!(output.contains("Mock Data (unknown)"));
    }
}
