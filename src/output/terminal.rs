//! Terminal rendering of tunnel settings.

use crate::models::DesiredSettings;
use crate::processing::{equivalent, snapshot, SettingsSnapshot};
use colored::Colorize;
use itertools::Itertools;

const LABEL_WIDTH: usize = 14;

/// Format a label, left-aligned and padded, followed by its value.
pub fn format_row<T: ToString>(label: &str, value: T) -> String {
    format!("{label:<LABEL_WIDTH$} {}", value.to_string())
}

/// Human-readable lines describing a settings value.
pub fn render_settings(settings: &DesiredSettings) -> Vec<String> {
    let mut lines = vec![
        format_row(
            "address",
            format!("{} / {}", settings.ipv4.address, settings.ipv4.subnet_mask),
        ),
        format_row(
            "routes",
            if settings.ipv4.included_routes.is_empty() {
                "none".to_string()
            } else {
                settings.ipv4.included_routes.iter().join(", ")
            },
        ),
    ];

    if let Some(v6) = &settings.ipv6 {
        lines.push(format_row("ipv6", format!("{}/{}", v6.address, v6.prefix)));
    }

    match &settings.dns {
        Some(dns) => {
            lines.push(format_row("dns servers", dns.servers.join(", ")));
            let scope = if dns.captures_all() {
                "all domains".to_string()
            } else {
                dns.match_domains.join(", ")
            };
            lines.push(format_row("dns match", scope));
        }
        None => lines.push(format_row("dns", "system default")),
    }

    lines.push(format_row("mtu", settings.mtu));
    lines
}

/// Whether the desired settings are what the tunnel last applied.
pub fn applied_status(
    desired: &DesiredSettings,
    applied: Option<&SettingsSnapshot>,
) -> &'static str {
    match applied {
        None => "not applied",
        Some(applied) if equivalent(&snapshot(desired), applied) => "applied",
        Some(_) => "pending, applied snapshot differs",
    }
}

/// Print the desired settings and, separately, the snapshot last applied.
pub fn print_settings(desired: &DesiredSettings, applied: Option<&SettingsSnapshot>) {
    println!("{}", "# Desired tunnel network settings".bold());
    for line in render_settings(desired) {
        println!("  {line}");
    }

    let status = applied_status(desired, applied);
    let status = if status == "applied" {
        status.green()
    } else {
        status.yellow()
    };
    println!("  {}", format_row("status", status));

    match applied.map(SettingsSnapshot::to_json) {
        Some(Ok(json)) => println!("{} {json}", "# Applied snapshot".bold()),
        Some(Err(e)) => log::warn!("Could not serialize snapshot: {e}"),
        None => println!("{}", "# Nothing applied yet".on_red()),
    }
}
