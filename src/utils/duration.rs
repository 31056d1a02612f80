//! Duration input handling

/// Parse a minutes field leniently: leading whitespace, an optional sign and
/// leading digits are accepted, anything after the digits is ignored.
///
/// Returns `None` when no digits lead the input or the value overflows.
pub fn parse_minutes(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let value: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Resolve the countdown length in seconds for a raw minutes input.
///
/// Missing, non-numeric, non-positive or overflowing input falls back to
/// `default_seconds`. The second value reports whether the fallback was used.
pub fn resolve_seconds(input: Option<&str>, default_seconds: u64) -> (u64, bool) {
    let seconds = input
        .and_then(parse_minutes)
        .filter(|minutes| *minutes > 0)
        .and_then(|minutes| minutes.checked_mul(60))
        .and_then(|seconds| u64::try_from(seconds).ok());

    match seconds {
        Some(seconds) => (seconds, false),
        None => (default_seconds, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_padded_numbers() {
        assert_eq!(parse_minutes("5"), Some(5));
        assert_eq!(parse_minutes("  7"), Some(7));
        assert_eq!(parse_minutes("+3"), Some(3));
        assert_eq!(parse_minutes("-3"), Some(-3));
    }

    #[test]
    fn ignores_trailing_garbage() {
        assert_eq!(parse_minutes("12abc"), Some(12));
        assert_eq!(parse_minutes("2.5"), Some(2));
    }

    #[test]
    fn rejects_non_numeric() {
        assert_eq!(parse_minutes(""), None);
        assert_eq!(parse_minutes("abc"), None);
        assert_eq!(parse_minutes("-"), None);
        assert_eq!(parse_minutes("99999999999999999999999"), None);
    }

    #[test]
    fn valid_input_converts_to_seconds() {
        assert_eq!(resolve_seconds(Some("1"), 300), (60, false));
        assert_eq!(resolve_seconds(Some("25"), 300), (1500, false));
    }

    #[test]
    fn invalid_input_falls_back_to_default() {
        assert_eq!(resolve_seconds(None, 300), (300, true));
        assert_eq!(resolve_seconds(Some("0"), 300), (300, true));
        assert_eq!(resolve_seconds(Some("-4"), 300), (300, true));
        assert_eq!(resolve_seconds(Some("soon"), 300), (300, true));
        assert_eq!(resolve_seconds(Some("9223372036854775807"), 300), (300, true));
    }
}
