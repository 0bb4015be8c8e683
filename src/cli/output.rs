//! Output formatting helpers for CLI commands

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

use crate::engine::Readiness;
use crate::protocol::SiteSettings;
use crate::store::{ServerKind, ServerState};

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: f64) -> String {
    if bytes <= 0.0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
    let exponent = (bytes.log(1024.0).floor().max(0.0) as usize).min(UNITS.len() - 1);
    format!(
        "{:.2} {}",
        bytes / 1024f64.powi(exponent as i32),
        UNITS[exponent]
    )
}

/// Format a throughput value as bytes per second.
pub fn format_speed(bytes_per_sec: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec))
}

/// Format an uptime in seconds with its most significant unit.
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86400;
    if days > 0 {
        return format!("{}d", days);
    }
    let hours = seconds / 3600;
    if hours > 0 {
        return format!("{}h", hours);
    }
    format!("{}m", seconds / 60)
}

/// Render the fleet header: site name plus readiness.
pub fn format_header(settings: &SiteSettings, readiness: Readiness) -> String {
    let readiness_str = match readiness {
        Readiness::Loading => "loading".yellow().to_string(),
        Readiness::Ready => "ready".green().to_string(),
    };
    format!("{} [{}]", settings.site_name.bold(), readiness_str)
}

/// Format the fleet as a table
pub fn format_fleet_table(states: &[ServerState]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Name", "Kind", "Location", "CPU", "Memory", "Rx", "Tx", "Uptime", "Status",
    ]);

    for state in states {
        let kind = match state.identity.kind {
            ServerKind::Local => "local",
            ServerKind::Remote => "remote",
        };
        let location = state.identity.location.as_deref().unwrap_or("-");
        let (cpu, memory, uptime) = match &state.snapshot {
            Some(snapshot) => (
                format!("{:.1}%", snapshot.cpu.usage),
                format!("{:.1}%", snapshot.memory.usage_percent),
                format_uptime(snapshot.uptime),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        let status = if state.connected {
            "online".green().to_string()
        } else {
            "offline".red().to_string()
        };

        table.add_row(vec![
            Cell::new(&state.identity.display_name),
            Cell::new(kind),
            Cell::new(location),
            Cell::new(cpu),
            Cell::new(memory),
            Cell::new(format_speed(state.speed.rx_per_sec)),
            Cell::new(format_speed(state.speed.tx_per_sec)),
            Cell::new(uptime),
            Cell::new(status),
        ]);
    }

    table.to_string()
}

/// Format the fleet as one JSON document
pub fn format_fleet_json(
    states: &[ServerState],
    settings: &SiteSettings,
    readiness: Readiness,
) -> String {
    serde_json::to_string_pretty(&json!({
        "readiness": readiness,
        "site_settings": settings,
        "servers": states,
    }))
    .unwrap()
}
