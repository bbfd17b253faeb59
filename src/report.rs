//! Report Rendering
//!
//! Text and JSON views of a finished [`Analysis`]: access points ranked by
//! signal with their users, a per-channel usage histogram and a run summary.

use anyhow::Result;
use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::{ReportConfig, ReportFormat};
use crate::wireless::{rank_by_signal, Analysis, SessionStats};

const UNITS: [&str; 7] = ["b", "k", "M", "G", "T", "E", "P"];

/// Compact byte count: "-----" for zero, otherwise one decimal and a
/// decimal-power suffix
pub fn humanbytes(bytes: u64) -> String {
    if bytes == 0 {
        return "-----".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value > 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{:.1}{}", value, UNITS[unit])
}

/// Qualitative signal level
pub fn rssi_descriptor(rssi: Option<i8>) -> &'static str {
    match rssi {
        None => "Unknown",
        Some(r) if r > -50 => "Excellent",
        Some(r) if r > -65 => "Good",
        Some(r) if r > -80 => "Fair",
        Some(r) if r > -110 => "Poor",
        Some(_) => "No Signal",
    }
}

/// A user's transmitted bytes as a percentage of what its AP received
pub fn share_percent(user_tx: u64, ap_rx: u64) -> f64 {
    if ap_rx == 0 {
        0.0
    } else {
        user_tx as f64 * 100.0 / ap_rx as f64
    }
}

/// Histogram bar length for one channel
pub fn bar_length(usage: u64, max_usage: u64, width: usize) -> usize {
    if max_usage == 0 {
        return 0;
    }
    ((width as u128 * usage as u128) / max_usage as u128) as usize
}

/// Table row for access points
#[derive(Tabled)]
struct AccessPointRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Users")]
    users: usize,
    #[tabled(rename = "Traffic")]
    traffic: String,
    #[tabled(rename = "Beacons")]
    beacons: u64,
    #[tabled(rename = "Ch")]
    channel: u8,
    #[tabled(rename = "SSID")]
    ssid: String,
    #[tabled(rename = "Signal")]
    signal: String,
}

/// Table row for channels
#[derive(Tabled)]
struct ChannelRow {
    #[tabled(rename = "Ch")]
    channel: u8,
    #[tabled(rename = "Traffic")]
    traffic: String,
    #[tabled(rename = "APs")]
    access_points: usize,
    #[tabled(rename = "Usage")]
    usage: String,
}

/// Render the analysis in the configured format
pub fn render(analysis: &Analysis, config: &ReportConfig) -> Result<String> {
    match config.format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(analysis)?),
        ReportFormat::Table => {
            let mut out = String::new();
            out.push_str(&render_access_points(analysis, config.show_users));
            out.push('\n');
            out.push_str(&render_channels(analysis, config.histogram_width));
            out.push('\n');
            out.push_str(&render_summary(&analysis.stats));
            Ok(out)
        }
    }
}

/// Access points strongest first, optionally followed by their users
pub fn render_access_points(analysis: &Analysis, show_users: bool) -> String {
    let registry = &analysis.registry;
    let ranked = rank_by_signal(registry);

    if ranked.is_empty() {
        return "No access points seen\n".to_string();
    }

    let rows: Vec<AccessPointRow> = ranked
        .iter()
        .map(|&id| {
            let ap = registry.get(id);
            AccessPointRow {
                mac: ap.address.to_string(),
                users: registry.users_of(ap.address).count(),
                traffic: humanbytes(ap.total_bytes()),
                beacons: ap.beacon_count,
                channel: ap.channel,
                ssid: ap.ssid_lossy(),
                signal: match ap.signal_strength {
                    Some(dbm) => format!("{} ({} dBm)", rssi_descriptor(Some(dbm)), dbm),
                    None => rssi_descriptor(None).to_string(),
                },
            }
        })
        .collect();

    let mut out = format!("{}\n{}\n", "Access Points".bold(), Table::new(rows));

    if show_users {
        for &id in &ranked {
            let ap = registry.get(id);
            let mut users = registry.users_of(ap.address).peekable();
            if users.peek().is_none() {
                continue;
            }

            let _ = writeln!(out, "\n{} {}", ap.address.to_string().cyan(), ap.ssid_lossy());
            for (_, user) in users {
                let _ = writeln!(
                    out,
                    "  {:>8} {:>6.1}%  {}",
                    humanbytes(user.tx_bytes),
                    share_percent(user.tx_bytes, ap.rx_bytes),
                    user.address
                );
            }
        }
    }

    out
}

/// Per-channel traffic with a usage histogram scaled to `width`
pub fn render_channels(analysis: &Analysis, width: usize) -> String {
    let report = &analysis.channels;

    let rows: Vec<ChannelRow> = report
        .iter()
        .map(|ch| {
            let len = bar_length(ch.usage, report.max_usage, width);
            let bar = "#".repeat(len);
            let bar = if len * 3 >= width * 2 {
                bar.red()
            } else if len * 3 >= width {
                bar.yellow()
            } else {
                bar.green()
            };
            ChannelRow {
                channel: ch.number,
                traffic: humanbytes(ch.traffic),
                access_points: ch.access_points.len(),
                usage: bar.to_string(),
            }
        })
        .collect();

    format!("{}\n{}\n", "Channels".bold(), Table::new(rows))
}

/// Frame counters and every recovered failure
pub fn render_summary(stats: &SessionStats) -> String {
    let mut out = format!("{}\n", "Summary".bold());
    let _ = writeln!(out, "Frames read:        {}", stats.frames_seen);
    let _ = writeln!(out, "Frames decoded:     {}", stats.frames_decoded);
    let _ = writeln!(
        out,
        "  beacons {} / data {} / control {}",
        stats.beacons, stats.data_frames, stats.control_frames
    );

    let failures = [
        ("Malformed frames:", stats.malformed_frames),
        ("Beacons w/o tags:", stats.missing_tags),
        ("Registry refusals:", stats.capacity_exceeded),
        ("Truncated files:", stats.partial_files),
    ];
    for (label, count) in failures {
        let count = if count > 0 {
            count.to_string().yellow().to_string()
        } else {
            count.to_string()
        };
        let _ = writeln!(out, "{:<20}{}", label, count);
    }
    out
}
