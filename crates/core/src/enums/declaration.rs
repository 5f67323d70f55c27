//! Enumerator value derivation and declaration parsing

use crate::error::{MirrorError, MirrorResult};

/// Explicitly written slots, given two evaluations of the same declaration
///
/// `prefilled` is the evaluation made with every slot pre-set to its
/// bit-inverted `normal` value. Explicit initializers overwrite the pre-fill
/// and agree across both passes; implicit slots keep whatever was there.
pub fn classify(normal: &[i64], prefilled: &[i64]) -> Vec<Option<i64>> {
    normal
        .iter()
        .zip(prefilled)
        .map(|(&a, &b)| (a == b).then_some(a))
        .collect()
}

/// Final values: explicit ones kept, implicit ones `previous + 1`, the
/// first implicit value defaulting to 0
pub fn derive_values(explicit: &[Option<i64>]) -> Vec<i64> {
    let mut next = 0i64;
    explicit
        .iter()
        .map(|slot| {
            let value = slot.unwrap_or(next);
            next = value.wrapping_add(1);
            value
        })
        .collect()
}

/// One parsed enumerator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumerator {
    pub name: String,
    pub explicit: Option<i64>,
}

fn invalid(enum_name: &str, reason: String) -> MirrorError {
    MirrorError::InvalidDeclaration {
        enum_name: enum_name.to_string(),
        reason,
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Parse an integer literal: optional sign, `0x`/`0b`/`0o` prefix,
/// underscores between digits
fn parse_literal(text: &str) -> Option<i64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text.strip_prefix('+').unwrap_or(text).trim_start()),
    };
    let lower = body.to_ascii_lowercase();
    let (radix, digits) = if let Some(d) = lower.strip_prefix("0x") {
        (16, d)
    } else if let Some(d) = lower.strip_prefix("0b") {
        (2, d)
    } else if let Some(d) = lower.strip_prefix("0o") {
        (8, d)
    } else {
        (10, lower.as_str())
    };
    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    if digits.is_empty() {
        return None;
    }
    let magnitude = u64::from_str_radix(&digits, radix).ok()?;
    if negative {
        if magnitude > i64::MIN.unsigned_abs() {
            return None;
        }
        Some((magnitude as i64).wrapping_neg())
    } else {
        // full-width hex masks wrap into the negative range
        Some(magnitude as i64)
    }
}

/// Parse `Name`, `Name = literal` and `Name = EarlierName` items separated
/// by commas; a trailing comma is accepted
pub fn parse(enum_name: &str, declaration: &str) -> MirrorResult<Vec<Enumerator>> {
    let mut parsed: Vec<Enumerator> = Vec::new();
    let mut resolved: Vec<(String, i64)> = Vec::new();
    let mut next = 0i64;

    for item in declaration.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, value) = match item.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (item, None),
        };
        if !is_identifier(name) {
            return Err(invalid(enum_name, format!("'{name}' is not an identifier")));
        }
        if parsed.iter().any(|e| e.name == name) {
            return Err(invalid(enum_name, format!("'{name}' is declared twice")));
        }

        let explicit = match value {
            None => None,
            Some(text) => {
                let value = parse_literal(text)
                    .or_else(|| {
                        resolved
                            .iter()
                            .find(|(earlier, _)| earlier == text)
                            .map(|&(_, v)| v)
                    })
                    .ok_or_else(|| invalid(enum_name, format!("cannot evaluate '{text}' for {name}")))?;
                Some(value)
            }
        };

        let value = explicit.unwrap_or(next);
        next = value.wrapping_add(1);
        resolved.push((name.to_string(), value));
        parsed.push(Enumerator {
            name: name.to_string(),
            explicit,
        });
    }

    if parsed.is_empty() {
        return Err(invalid(enum_name, "no enumerators".to_string()));
    }
    Ok(parsed)
}

/// Enumerator names only, ignoring initializers
pub fn names(declaration: &str) -> Vec<&str> {
    declaration
        .split(',')
        .filter_map(|item| item.split('=').next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_values() {
        assert_eq!(derive_values(&[None, Some(5), None]), vec![0, 5, 6]);
        assert_eq!(derive_values(&[Some(-2), None, Some(10), None]), vec![-2, -1, 10, 11]);
        assert!(derive_values(&[]).is_empty());
    }

    #[test]
    fn test_classify_two_passes() {
        // A, B = 5, C with garbage 40/41 left in the implicit slots
        let normal = [40, 5, 41];
        let prefilled = [!40, 5, !41];
        let explicit = classify(&normal, &prefilled);
        assert_eq!(explicit, vec![None, Some(5), None]);
        assert_eq!(derive_values(&explicit), vec![0, 5, 6]);
    }

    #[test]
    fn test_parse_forms() {
        let parsed = parse("Mode", "Off, On = 0x10, Auto, Legacy = On, Bits = 0b1_01,").unwrap();
        let explicit: Vec<_> = parsed.iter().map(|e| e.explicit).collect();
        assert_eq!(explicit, vec![None, Some(16), None, Some(16), Some(5)]);
        assert_eq!(parsed[3].name, "Legacy");
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse_literal("-3"), Some(-3));
        assert_eq!(parse_literal("+7"), Some(7));
        assert_eq!(parse_literal("1_000"), Some(1000));
        assert_eq!(parse_literal("0o17"), Some(15));
        assert_eq!(parse_literal("0xFFFFFFFFFFFFFFFF"), Some(-1));
        assert_eq!(parse_literal("-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse_literal("abc"), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse("E", "A, A"),
            Err(MirrorError::InvalidDeclaration { .. })
        ));
        assert!(parse("E", "A = Later, Later").is_err());
        assert!(parse("E", "1A").is_err());
        assert!(parse("E", " , ").is_err());
    }

    #[test]
    fn test_names_only() {
        assert_eq!(names("A, B = 5, C"), vec!["A", "B", "C"]);
    }
}
