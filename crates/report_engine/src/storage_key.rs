use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

const FALLBACK_NAME: &str = "statement.pdf";
const MAX_NAME_CHARS: usize = 80;

/// Unique, URL-safe object key: `{utc_millis}-{short_hash(bytes)}-{sanitized_name}`.
pub fn storage_key(original_name: &str, bytes: &[u8], now: DateTime<Utc>) -> String {
    let name = sanitize_name(original_name);
    let hash = short_hash(bytes);
    format!("{}-{hash}-{name}", now.timestamp_millis())
}

fn sanitize_name(input: &str) -> String {
    // Keep only the final path component of whatever the picker reported.
    let base = input.rsplit(['/', '\\']).next().unwrap_or(input);

    let mut compacted = String::with_capacity(base.len());
    let mut prev_underscore = false;
    for c in base.chars() {
        let c = if is_key_safe(c) { c } else { '_' };
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = compacted.trim_matches(&['_', '.', '-'][..]);
    if trimmed.is_empty() {
        return FALLBACK_NAME.to_string();
    }
    if trimmed.chars().count() <= MAX_NAME_CHARS {
        return trimmed.to_string();
    }

    // Cut the stem, keep the extension.
    match trimmed.rsplit_once('.') {
        Some((stem, ext)) if ext.chars().count() < 10 => {
            let budget = MAX_NAME_CHARS - ext.chars().count() - 1;
            let stem: String = stem.chars().take(budget).collect();
            format!("{stem}.{ext}")
        }
        _ => trimmed.chars().take(MAX_NAME_CHARS).collect(),
    }
}

fn is_key_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

fn short_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
