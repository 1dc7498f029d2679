//! Helpers for hex strings in logs and configuration values.

/// Shortens a hex digest to `0x` and its first 8 digits for log lines.
pub fn truncate_id(id: &str) -> String {
	match id.get(..10) {
		Some(head) if id.len() > 10 => format!("{}..", head),
		_ => id.to_string(),
	}
}

/// Strips a leading `0x` or `0X`.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}
