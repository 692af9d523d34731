use std::cmp::Ordering;

/// Compare dotted version strings numerically, part by part.
///
/// Missing parts count as `0` (`1.0` == `1.0.0`) and a non-numeric part is
/// read up to its first non-digit (`1.0.1-beta` == `1.0.1`).
pub fn compare(left: &str, right: &str) -> Ordering {
    let left = parts(left);
    let right = parts(right);
    let len = left.len().max(right.len());
    (0..len)
        .map(|i| {
            let l = left.get(i).copied().unwrap_or(0);
            let r = right.get(i).copied().unwrap_or(0);
            l.cmp(&r)
        })
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// `true` when `found` (missing counts as `0`) is at least `minimum`.
pub fn at_least(found: Option<&str>, minimum: &str) -> bool {
    compare(found.unwrap_or("0"), minimum) != Ordering::Less
}

fn parts(version: &str) -> Vec<u64> {
    version
        .trim()
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_not_lexical() {
        assert_eq!(compare("1.0.10", "1.0.9"), Ordering::Greater);
        assert_eq!(compare("1.0.1", "1.0.1"), Ordering::Equal);
        assert_eq!(compare("1.0.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare("1.1", "1.0.9"), Ordering::Greater);
    }

    #[test]
    fn test_revision_gate() {
        assert!(at_least(Some("1388"), "1388"));
        assert!(at_least(Some("1400"), "1388"));
        assert!(!at_least(Some("999"), "1388"));
        assert!(!at_least(None, "1388"));
    }

    #[test]
    fn test_suffixes_are_ignored() {
        assert_eq!(compare("1.0.1-beta", "1.0.1"), Ordering::Equal);
    }
}
