use super::ui;
use crate::core::{FundSnapshot, Period};
use crate::service::SnapshotService;
use anyhow::Result;
use comfy_table::{Cell, Color};

/// Forces a rebuild of the snapshot payload and prints the result as tables.
pub async fn run(service: &SnapshotService) -> Result<()> {
    let spinner = ui::new_spinner("Refreshing snapshot...");
    let result = service.refresh().await;
    spinner.finish_and_clear();
    let payload = result?;

    print_section("Funds", &payload.funds);
    ui::print_separator();
    print_section("Plans", &payload.plans);

    println!(
        "\n{}",
        ui::style_text(
            &format!("Last updated: {}", payload.last_updated.to_rfc3339()),
            ui::StyleType::Subtle,
        )
    );

    let failures = payload
        .funds
        .iter()
        .chain(payload.plans.iter())
        .filter(|snap| snap.debug.error.is_some())
        .count();
    if failures > 0 {
        println!(
            "{}",
            ui::style_text(
                &format!("{failures} entries could not be fetched"),
                ui::StyleType::Error,
            )
        );
    }

    Ok(())
}

fn print_section(title: &str, snapshots: &[FundSnapshot]) {
    println!("\n{}", ui::style_text(title, ui::StyleType::Title));

    if snapshots.is_empty() {
        println!("{}", ui::style_text("none configured", ui::StyleType::Subtle));
        return;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Name"),
        ui::header_cell("ISIN"),
        ui::header_cell("Category"),
        ui::header_cell("1Y"),
        ui::header_cell("3Y Anual"),
        ui::header_cell("5Y Anual"),
        ui::header_cell("Sharpe 3Y"),
        ui::header_cell("Volat. 3Y"),
        ui::header_cell("TER"),
    ]);

    for snap in snapshots {
        let name_cell = if snap.debug.error.is_some() {
            Cell::new(&snap.name).fg(Color::Red)
        } else {
            Cell::new(&snap.name)
        };
        table.add_row(vec![
            name_cell,
            Cell::new(&snap.isin),
            Cell::new(&snap.category),
            ui::metric_cell(snap.performance.get(&Period::OneYear)),
            ui::metric_cell(snap.performance.get(&Period::ThreeYearsAnnualized)),
            ui::metric_cell(snap.performance.get(&Period::FiveYearsAnnualized)),
            ui::metric_cell(snap.sharpe.get(&Period::ThreeYears)),
            ui::metric_cell(snap.volatility.get(&Period::ThreeYears)),
            ui::ter_cell(&snap.ter),
        ]);
    }

    println!("{table}");
}
