use relacs_trace::RangeLoop;

/// Parses a macro parameter value as a numeric range (spec.md §6:
/// `first..last..step`, `first..*factor..last`, optionally suffixed
/// `|i:<n>` to set the initial bisection increment). Returns `None` for
/// plain scalar values, which the caller should fall back to parsing as a
/// single number.
pub fn parse_range_param(value: &str) -> Option<RangeLoop> {
    let (body, increment) = match value.split_once("|i:") {
        Some((body, n)) => (body, n.trim().parse::<i64>().ok()),
        None => (value, None),
    };

    let parts: Vec<&str> = body.split("..").collect();
    if parts.len() != 3 {
        return None;
    }
    let first: f64 = parts[0].trim().parse().ok()?;
    let last: f64 = parts[2].trim().parse().ok()?;

    let range = if let Some(factor_str) = parts[1].trim().strip_prefix('*') {
        let factor: f64 = factor_str.trim().parse().ok()?;
        RangeLoop::logarithmic(first, last, factor)
    } else {
        let step: f64 = parts[1].trim().parse().ok()?;
        RangeLoop::linear(first, last, step)
    };

    Some(match increment {
        Some(n) => range.with_increment(n),
        None => range,
    })
}

/// `true` if `value` looks like a range rather than a plain scalar, i.e.
/// it would be meaningful to pass to [`parse_range_param`].
pub fn looks_like_range(value: &str) -> bool {
    value.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_linear_range() {
        let range = parse_range_param("0..10..2").unwrap();
        assert_eq!(range.len(), 6);
    }

    #[test]
    fn parses_a_logarithmic_range() {
        let range = parse_range_param("1..*2..16").unwrap();
        assert_eq!(range.len(), 5);
    }

    #[test]
    fn parses_an_initial_increment_suffix() {
        let range = parse_range_param("0..10..2|i:4").unwrap();
        assert_eq!(range.len(), 6);
    }

    #[test]
    fn plain_scalar_is_not_a_range() {
        assert!(parse_range_param("1.5").is_none());
        assert!(!looks_like_range("1.5"));
    }
}
