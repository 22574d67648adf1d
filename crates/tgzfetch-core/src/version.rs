//! Best-effort version coercion.
//!
//! `coerce` reduces a free-form range string to the first embedded literal
//! version, the way node-semver's `coerce` does. It is a heuristic, not a
//! range solver: comparator ranges are scanned for a literal, never
//! satisfied against available versions. Callers fall back to the
//! registry's `latest` tag when coercion yields nothing.

/// Extracts the first `major.minor.patch` version embedded in `range`,
/// defaulting missing components to 0. Returns `None` when the string
/// contains no digits (`"*"`, `"latest"`, `""`).
pub fn coerce(range: &str) -> Option<String> {
    let bytes = range.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;

    let mut rest = &range[start..];
    let major = take_number(&mut rest)?;
    let minor = take_dot_number(&mut rest).unwrap_or(0);
    let patch = take_dot_number(&mut rest).unwrap_or(0);

    Some(format!("{}.{}.{}", major, minor, patch))
}

/// Consumes a leading digit run from `rest` and parses it.
fn take_number(rest: &mut &str) -> Option<u64> {
    let end = rest
        .as_bytes()
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let num = rest[..end].parse().ok()?;
    *rest = &rest[end..];
    Some(num)
}

/// Consumes `.<digits>` from `rest`, if present. A dot followed by a
/// non-digit (e.g. `1.x`) consumes nothing.
fn take_dot_number(rest: &mut &str) -> Option<u64> {
    let after_dot = rest.strip_prefix('.')?;
    let mut candidate = after_dot;
    let num = take_number(&mut candidate)?;
    *rest = candidate;
    Some(num)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_strips_range_operators() {
        assert_eq!(coerce("^1.2.3").as_deref(), Some("1.2.3"));
        assert_eq!(coerce("~2.0.0").as_deref(), Some("2.0.0"));
        assert_eq!(coerce(">=3.1.4").as_deref(), Some("3.1.4"));
        assert_eq!(coerce("=0.9.2").as_deref(), Some("0.9.2"));
    }

    #[test]
    fn coerce_exact_and_prefixed_versions() {
        assert_eq!(coerce("1.2.3").as_deref(), Some("1.2.3"));
        assert_eq!(coerce("v2.1").as_deref(), Some("2.1.0"));
    }

    #[test]
    fn coerce_fills_missing_components_with_zero() {
        assert_eq!(coerce("1").as_deref(), Some("1.0.0"));
        assert_eq!(coerce("16.8").as_deref(), Some("16.8.0"));
        assert_eq!(coerce("1.x").as_deref(), Some("1.0.0"));
        assert_eq!(coerce("2.*").as_deref(), Some("2.0.0"));
    }

    #[test]
    fn coerce_comparator_range_takes_first_literal() {
        assert_eq!(coerce(">=1.0 <2.0").as_deref(), Some("1.0.0"));
        assert_eq!(coerce("1.2.7 || >=1.2.9").as_deref(), Some("1.2.7"));
    }

    #[test]
    fn coerce_digitless_input_yields_nothing() {
        assert_eq!(coerce("*"), None);
        assert_eq!(coerce("latest"), None);
        assert_eq!(coerce(""), None);
        assert_eq!(coerce("x"), None);
    }
}
