//! Test selection
//!
//! The engine only asks a [`Selection`] whether a test path is included.
//! [`PatternSelection`] covers the common case of include and exclude
//! pattern lists.

/// Decides which test paths take part in a run
pub trait Selection: Send + Sync {
    fn includes(&self, path: &str) -> bool;
}

impl<F> Selection for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn includes(&self, path: &str) -> bool {
        self(path)
    }
}

/// Includes every test
#[derive(Clone, Copy, Debug, Default)]
pub struct SelectAll;

impl Selection for SelectAll {
    fn includes(&self, _path: &str) -> bool {
        true
    }
}

/// Include and exclude patterns, where `*` matches any run of characters
///
/// No include patterns means everything is included. A path matching an
/// exclude pattern is excluded even if it also matches an include.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatternSelection {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl PatternSelection {
    /// Build from comma-separated pattern lists.
    pub fn new(include: &str, exclude: &str) -> Self {
        Self::from_patterns(split(include), split(exclude))
    }

    pub fn from_patterns(include: Vec<String>, exclude: Vec<String>) -> Self {
        let keep = |patterns: Vec<String>| -> Vec<String> {
            patterns
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        };
        Self {
            include: keep(include),
            exclude: keep(exclude),
        }
    }

    pub fn include_patterns(&self) -> &[String] {
        &self.include
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude
    }

    pub fn is_unrestricted(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

impl Selection for PatternSelection {
    fn includes(&self, path: &str) -> bool {
        if self.exclude.iter().any(|p| matches(p, path)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|p| matches(p, path))
    }
}

fn split(list: &str) -> Vec<String> {
    list.split(',').map(str::to_string).collect()
}

/// Glob match. `*` matches any run of characters, including `.`; every
/// other character, `?` and `[` included, matches only itself.
fn matches(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut resume = 0;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            resume = t;
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some(s) = star {
            p = s + 1;
            resume += 1;
            t = resume;
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_matching() {
        assert!(matches("calc.*", "calc.add"));
        assert!(matches("*", ""));
        assert!(matches("*.add", "calc.edge.add"));
        assert!(matches("c*c.*d", "calc.add"));
        assert!(matches("calc.add", "calc.add"));
        assert!(!matches("calc.add", "calc.adds"));
        assert!(!matches("calc.*", "calculator.add"));
        assert!(!matches("", "x"));
    }

    #[test]
    fn test_only_star_is_special() {
        assert!(matches("calc.a?d", "calc.a?d"));
        assert!(!matches("calc.a?d", "calc.add"));
        assert!(matches("[x]*", "[x].t"));
        assert!(!matches("[x]*", "x.t"));
    }

    #[test]
    fn test_exclusion_wins() {
        let selection = PatternSelection::new("calc.*", "calc.slow.*");
        assert!(selection.includes("calc.add"));
        assert!(!selection.includes("calc.slow.fib"));
        assert!(!selection.includes("other.add"));
    }

    #[test]
    fn test_empty_entries_are_ignored() {
        let selection = PatternSelection::new(" , ,", "");
        assert!(selection.is_unrestricted());
        assert!(selection.includes("anything"));

        let selection = PatternSelection::new("a.b, c.*", "");
        assert_eq!(selection.include_patterns(), ["a.b", "c.*"]);
    }

    #[test]
    fn test_closures_select() {
        let selection = |path: &str| path.ends_with("add");
        assert!(selection.includes("calc.add"));
        assert!(!selection.includes("calc.div"));
        assert!(SelectAll.includes(""));
    }
}
