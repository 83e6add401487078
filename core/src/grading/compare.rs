use serde::Deserialize;

/// Full credit for a byte-exact match.
pub const STRONG: f64 = 1.0;
/// Partial credit when only trailing whitespace differs.
pub const NORMAL: f64 = 0.8;
/// Partial credit when only the token sequence matches.
pub const WEAK: f64 = 0.6;

/// Comparison strategy, selected per problem in the registry.
///
/// `TieredIgnoreBlank` is for problems whose expected formatting allows
/// extra blank lines: blank-line (and trailing-whitespace) differences
/// still earn full credit there.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Comparator {
    Exact,
    Tiered,
    TieredIgnoreBlank,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub passed: bool,
    pub score: f64,
    pub expected_repr: Option<String>,
    pub actual_repr: Option<String>,
}

impl Verdict {
    fn full() -> Self {
        Self {
            passed: true,
            score: STRONG,
            expected_repr: None,
            actual_repr: None,
        }
    }

    fn partial(score: f64, expected: &str, actual: &str) -> Self {
        Self {
            passed: true,
            score,
            expected_repr: Some(visible(expected)),
            actual_repr: Some(visible(actual)),
        }
    }

    fn fail(expected: &str, actual: &str) -> Self {
        Self {
            passed: false,
            score: 0.0,
            expected_repr: Some(visible(expected)),
            actual_repr: Some(visible(actual)),
        }
    }

    pub fn is_full(&self) -> bool {
        self.passed && self.score >= STRONG
    }
}

/// Escape-visible rendering of a text, so that whitespace and control
/// characters show up in diagnostics.
pub fn visible(s: &str) -> String {
    format!("{:?}", s)
}

impl Comparator {
    pub fn compare(&self, expected: &str, actual: &str) -> Verdict {
        match self {
            Self::Exact => exact(expected, actual),
            Self::Tiered => tiered(expected, actual),
            Self::TieredIgnoreBlank => tiered_ignore_blank(expected, actual),
        }
    }
}

fn exact(expected: &str, actual: &str) -> Verdict {
    if expected == actual {
        Verdict::full()
    } else {
        Verdict::fail(expected, actual)
    }
}

/// Lines of `s` with trailing whitespace removed, after dropping the
/// trailing blank-line run of the whole text.
fn trimmed_lines(s: &str) -> Vec<&str> {
    s.trim_end().split('\n').map(str::trim_end).collect()
}

fn tokens(s: &str) -> Vec<&str> {
    s.split_whitespace().collect()
}

fn tiered(expected: &str, actual: &str) -> Verdict {
    if expected == actual {
        return Verdict::full();
    }
    if trimmed_lines(expected) == trimmed_lines(actual) {
        return Verdict::partial(NORMAL, expected, actual);
    }
    if tokens(expected) == tokens(actual) {
        return Verdict::partial(WEAK, expected, actual);
    }
    Verdict::fail(expected, actual)
}

fn nonblank_lines(s: &str) -> Vec<&str> {
    trimmed_lines(s)
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect()
}

fn tiered_ignore_blank(expected: &str, actual: &str) -> Verdict {
    if expected == actual {
        return Verdict::full();
    }
    if nonblank_lines(expected) == nonblank_lines(actual) {
        return Verdict::full();
    }
    if tokens(expected) == tokens(actual) {
        return Verdict::partial(WEAK, expected, actual);
    }
    Verdict::fail(expected, actual)
}
