use std::path::Path;

use serde_json::Value;

pub const FALLBACK_MESSAGE: &str = "Update card data bundle";

/// Commit message summarizing the version descriptor's counts.
///
/// Never fails: a missing, unreadable or malformed descriptor yields
/// [`FALLBACK_MESSAGE`].
pub fn commit_message(descriptor_path: &Path) -> String {
    summarize(descriptor_path).unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

fn summarize(descriptor_path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(descriptor_path).ok()?;
    let descriptor: Value = serde_json::from_str(&content).ok()?;

    let count = |key: &str| descriptor.get(key).and_then(Value::as_u64);

    let mut parts = vec![format!("{} cards", count("cards_count")?)];
    if let Some(n) = count("programs_count") {
        parts.push(format!("{} programs", n));
    }
    if let Some(n) = count("program_quarters_count") {
        parts.push(format!("{} program quarters", n));
    }
    if let Some(n) = count("conditions_count") {
        parts.push(format!("{} with conditions", n));
    }

    let mut message = format!("Update card data: {}", parts.join(", "));
    if let Some(version) = descriptor.get("version").and_then(Value::as_str) {
        message.push_str(&format!(" ({})", version));
    }
    Some(message)
}
