use comfy_table::{Attribute, Cell as TableCell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::core::{Alert, Metrics, Severity, Snapshot};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

const fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Grey,
        Severity::Warning => Color::DarkYellow,
        Severity::Critical => Color::Red,
    }
}

/// Status board: one row per cell, matching the original dashboard's
/// overview table.
pub fn build_status_table(snapshot: &Snapshot) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Cell",
        "Voltage",
        "Current",
        "Temperature",
        "SoC",
        "Efficiency",
        "Power density",
        "SoH trend",
    ]);
    for (id, cell) in &snapshot.cells {
        let metrics = &cell.metrics;
        let Some(reading) = &cell.reading else {
            table.add_row(vec![
                TableCell::new(id),
                TableCell::new("no telemetry yet").add_attribute(Attribute::Dim),
            ]);
            continue;
        };
        table.add_row(vec![
            TableCell::new(id),
            TableCell::new(reading.voltage).set_alignment(CellAlignment::Right),
            TableCell::new(reading.current).set_alignment(CellAlignment::Right).fg(
                if reading.current.is_discharge() { Color::Red } else { Color::Green },
            ),
            TableCell::new(reading.temperature).set_alignment(CellAlignment::Right),
            TableCell::new(format!("{:.1}%", metrics.state_of_charge * 100.0))
                .set_alignment(CellAlignment::Right)
                .fg(soc_color(metrics)),
            TableCell::new(format!("{:.2}", metrics.efficiency))
                .set_alignment(CellAlignment::Right),
            TableCell::new(format!("{:.3}", metrics.power_density))
                .set_alignment(CellAlignment::Right),
            TableCell::new(format!("{:+.3} Ah/h", metrics.state_of_health_trend))
                .set_alignment(CellAlignment::Right)
                .fg(if metrics.state_of_health_trend < 0.0 { Color::Red } else { Color::Reset }),
        ]);
    }
    table
}

fn soc_color(metrics: &Metrics) -> Color {
    if metrics.state_of_charge < 0.1 {
        Color::Red
    } else if metrics.state_of_charge < 0.3 {
        Color::DarkYellow
    } else {
        Color::Green
    }
}

pub fn build_alerts_table<'a>(alerts: impl IntoIterator<Item = &'a Alert>) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Severity", "Cell", "Kind", "Raised at", "Message"]);
    for alert in alerts
        .into_iter()
        .sorted_by_key(|alert| (std::cmp::Reverse(alert.severity), alert.id.clone()))
    {
        table.add_row(vec![
            TableCell::new(format!("{:?}", alert.severity)).fg(severity_color(alert.severity)),
            TableCell::new(&alert.cell_id),
            TableCell::new(alert.kind.as_str()),
            TableCell::new(alert.raised_at.format("%H:%M:%S")),
            TableCell::new(&alert.message),
        ]);
    }
    table
}
