//! Unsigned numeric literal parsing.
//!
//! Follows the C `strtoul(s, &end, 0)` convention nearly every handler
//! relied on: `0x`/`0X` selects hexadecimal, a leading `0` octal, anything
//! else decimal. Unlike `strtoul`, the parse is all-or-nothing: a trailing
//! unconsumed character, an empty string, or a sign fails the whole parse,
//! so `"12x"` is rejected rather than read as 12.

/// Parse an unsigned 32-bit literal with base auto-detection.
pub fn parse_u32(s: &str) -> Option<u32> {
    parse_u64(s).and_then(|v| u32::try_from(v).ok())
}

/// Parse an unsigned 64-bit literal with base auto-detection.
pub fn parse_u64(s: &str) -> Option<u64> {
    if s.starts_with('+') || s.starts_with('-') {
        return None;
    }
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };
    if digits.is_empty() || digits.starts_with('+') {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}
