//! Maven version ordering and range expressions.
//!
//! Maven versions do not follow semver. Tokens are split on `.` and `-`,
//! numbers compare numerically, and well-known qualifiers have their own
//! ladder: `alpha` < `beta` < `milestone` < `rc` < `snapshot` < release
//! (empty) < `sp`. Unknown text qualifiers sort below a release.

use std::cmp::Ordering;
use std::fmt;

/// A parsed Maven version with comparable tokens.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    pub original: String,
    tokens: Vec<Token>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Token {
    Number(u64),
    Qualifier(Qualifier),
    Text(String),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum Qualifier {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
}

impl MavenVersion {
    pub fn parse(version: &str) -> Self {
        Self {
            original: version.to_string(),
            tokens: tokenize(version),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        self.original.ends_with("-SNAPSHOT")
    }
}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.tokens.len().max(other.tokens.len());
        for i in 0..len {
            let ord = match (self.tokens.get(i), other.tokens.get(i)) {
                (None, None) => Ordering::Equal,
                (Some(t), None) => cmp_to_padding(t),
                (None, Some(t)) => cmp_to_padding(t).reverse(),
                (Some(a), Some(b)) => cmp_tokens(a, b),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// How a trailing token compares against the implicit padding of a shorter
/// version: `1.0` == `1.0.0`, `1.0` > `1.0-rc`, `1.0-sp` > `1.0`.
fn cmp_to_padding(token: &Token) -> Ordering {
    match token {
        Token::Number(0) => Ordering::Equal,
        Token::Number(_) => Ordering::Greater,
        Token::Qualifier(q) => q.cmp(&Qualifier::Release),
        Token::Text(t) if t.is_empty() => Ordering::Equal,
        Token::Text(_) => Ordering::Less,
    }
}

fn cmp_tokens(a: &Token, b: &Token) -> Ordering {
    match (a, b) {
        (Token::Number(a), Token::Number(b)) => a.cmp(b),
        (Token::Qualifier(a), Token::Qualifier(b)) => a.cmp(b),
        (Token::Text(a), Token::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Token::Number(_), _) => Ordering::Greater,
        (_, Token::Number(_)) => Ordering::Less,
        (Token::Qualifier(q), Token::Text(_)) => {
            if *q >= Qualifier::Release {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Token::Text(_), Token::Qualifier(q)) => {
            if *q >= Qualifier::Release {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
    }
}

fn tokenize(version: &str) -> Vec<Token> {
    version
        .split(['.', '-'])
        .filter(|t| !t.is_empty())
        .map(classify)
        .collect()
}

fn classify(token: &str) -> Token {
    if let Ok(n) = token.parse::<u64>() {
        return Token::Number(n);
    }
    match token.to_lowercase().as_str() {
        "alpha" | "a" => Token::Qualifier(Qualifier::Alpha),
        "beta" | "b" => Token::Qualifier(Qualifier::Beta),
        "milestone" | "m" => Token::Qualifier(Qualifier::Milestone),
        "rc" | "cr" => Token::Qualifier(Qualifier::Rc),
        "snapshot" => Token::Qualifier(Qualifier::Snapshot),
        "ga" | "final" | "release" => Token::Qualifier(Qualifier::Release),
        "sp" => Token::Qualifier(Qualifier::Sp),
        _ => Token::Text(token.to_string()),
    }
}

/// A Maven version range: `[1.0,2.0)`, `(,2.0]`, `[1.0,]`, or exact `[1.0]`.
#[derive(Debug, Clone)]
pub struct VersionRange {
    lower: Option<Bound>,
    upper: Option<Bound>,
}

#[derive(Debug, Clone)]
struct Bound {
    version: MavenVersion,
    inclusive: bool,
}

/// Whether a version string is a range expression rather than a bare version.
pub fn is_range(spec: &str) -> bool {
    let s = spec.trim();
    s.starts_with('[') || s.starts_with('(')
}

impl VersionRange {
    /// Parse a range expression. Returns `None` for bare versions.
    pub fn parse(spec: &str) -> Option<Self> {
        let s = spec.trim();
        if !is_range(s) || s.len() < 2 {
            return None;
        }
        let open_inclusive = s.starts_with('[');
        let close_inclusive = s.ends_with(']');
        if !close_inclusive && !s.ends_with(')') {
            return None;
        }
        let inner = &s[1..s.len() - 1];

        if let Some((lower, upper)) = inner.split_once(',') {
            let bound = |text: &str, inclusive: bool| {
                let text = text.trim();
                (!text.is_empty()).then(|| Bound {
                    version: MavenVersion::parse(text),
                    inclusive,
                })
            };
            Some(VersionRange {
                lower: bound(lower, open_inclusive),
                upper: bound(upper, close_inclusive),
            })
        } else {
            // [1.0] pins exactly 1.0
            let exact = MavenVersion::parse(inner.trim());
            Some(VersionRange {
                lower: Some(Bound {
                    version: exact.clone(),
                    inclusive: true,
                }),
                upper: Some(Bound {
                    version: exact,
                    inclusive: true,
                }),
            })
        }
    }

    /// Whether `version` satisfies this range.
    pub fn contains(&self, version: &MavenVersion) -> bool {
        if let Some(lower) = &self.lower {
            let ord = version.cmp(&lower.version);
            if ord == Ordering::Less || (!lower.inclusive && ord == Ordering::Equal) {
                return false;
            }
        }
        if let Some(upper) = &self.upper {
            let ord = version.cmp(&upper.version);
            if ord == Ordering::Greater || (!upper.inclusive && ord == Ordering::Equal) {
                return false;
            }
        }
        true
    }
}

/// Resolve a range expression against the available versions of a
/// coordinate: the highest satisfying version wins. Returns `None` when the
/// spec is not a range or nothing satisfies it.
pub fn select_from(spec: &str, available: &[String]) -> Option<String> {
    let range = VersionRange::parse(spec)?;
    available
        .iter()
        .map(|v| MavenVersion::parse(v))
        .filter(|v| range.contains(v))
        .max()
        .map(|v| v.original)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ordering() {
        assert!(MavenVersion::parse("1.0") < MavenVersion::parse("2.0"));
        assert!(MavenVersion::parse("1.0.1") < MavenVersion::parse("1.1.0"));
        assert!(MavenVersion::parse("1.9") < MavenVersion::parse("1.10"));
    }

    #[test]
    fn qualifier_ladder() {
        let order = ["1.0-alpha", "1.0-beta", "1.0-m", "1.0-rc", "1.0-SNAPSHOT", "1.0", "1.0-sp"];
        for pair in order.windows(2) {
            assert!(
                MavenVersion::parse(pair[0]) < MavenVersion::parse(pair[1]),
                "{} should sort before {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn trailing_zeros_are_equal() {
        assert_eq!(MavenVersion::parse("1.0"), MavenVersion::parse("1.0.0"));
    }

    #[test]
    fn text_qualifier_below_release() {
        assert!(MavenVersion::parse("1.0.0-jre") < MavenVersion::parse("1.0.0"));
        assert!(MavenVersion::parse("31.0-jre") < MavenVersion::parse("32.0-jre"));
    }

    #[test]
    fn snapshot_detection() {
        assert!(MavenVersion::parse("1.0-SNAPSHOT").is_snapshot());
        assert!(!MavenVersion::parse("1.0").is_snapshot());
    }

    #[test]
    fn range_inclusive_and_exclusive() {
        let range = VersionRange::parse("[1.0,2.0)").unwrap();
        assert!(range.contains(&MavenVersion::parse("1.0")));
        assert!(range.contains(&MavenVersion::parse("1.9.9")));
        assert!(!range.contains(&MavenVersion::parse("2.0")));
        assert!(!range.contains(&MavenVersion::parse("0.9")));
    }

    #[test]
    fn range_open_lower() {
        let range = VersionRange::parse("(,2.0]").unwrap();
        assert!(range.contains(&MavenVersion::parse("0.1")));
        assert!(range.contains(&MavenVersion::parse("2.0")));
        assert!(!range.contains(&MavenVersion::parse("2.0.1")));
    }

    #[test]
    fn range_exact_pin() {
        let range = VersionRange::parse("[1.5]").unwrap();
        assert!(range.contains(&MavenVersion::parse("1.5")));
        assert!(!range.contains(&MavenVersion::parse("1.5.1")));
    }

    #[test]
    fn bare_version_is_not_a_range() {
        assert!(!is_range("1.0"));
        assert!(VersionRange::parse("1.0").is_none());
    }

    #[test]
    fn select_highest_satisfying() {
        let available = vec![
            "0.9".to_string(),
            "1.0".to_string(),
            "1.5".to_string(),
            "2.0".to_string(),
        ];
        assert_eq!(select_from("[1.0,2.0)", &available), Some("1.5".to_string()));
        assert_eq!(select_from("[3.0,)", &available), None);
        assert_eq!(select_from("1.0", &available), None);
    }
}
