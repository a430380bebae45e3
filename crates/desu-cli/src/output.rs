//! Output formatting helpers.

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use desu_core::Record;
use desu_store::ServerEntry;

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a dimmed note on stderr, out of the way of piped output.
pub fn note(msg: &str) {
    eprintln!("{}", msg.dimmed());
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a value as JSON, pretty or compact.
pub fn json_as<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    if pretty { json_pretty(value) } else { json(value) }
}

/// Epoch milliseconds as an RFC 3339 timestamp, or the raw number if out of range.
pub fn timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| millis.to_string())
}

/// Human-readable lifetime: "forever" for 0, otherwise whole hours or ms.
pub fn lifetime(millis: u64) -> String {
    const HOUR: u64 = 3_600_000;
    match millis {
        0 => "forever".to_string(),
        m if m % HOUR == 0 => format!("{}h", m / HOUR),
        m => format!("{m}ms"),
    }
}

/// Print a known server as labeled fields.
pub fn server(record: &Record<ServerEntry>) {
    field("ID", &record.id.to_string());
    field("URL", &record.data.url);
    field("Name", &record.data.name);
    field("Icon", &record.data.icon);
    field("Lifetime", &lifetime(record.data.lifetime));
    field("Version", &record.data.version.to_string());
}
