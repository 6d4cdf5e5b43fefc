use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// FZF-style ranking for the version list: prefix beats substring beats fuzzy.
pub struct VersionMatcher {
    matcher: SkimMatcherV2,
}

impl VersionMatcher {
    pub fn new() -> Self {
        Self {
            matcher: SkimMatcherV2::default(),
        }
    }

    pub fn score(&self, pattern: &str, text: &str) -> Option<i64> {
        if pattern.is_empty() {
            return Some(0);
        }
        if text.starts_with(pattern) {
            return Some(2000 + (pattern.len() * 10) as i64);
        }
        if text.contains(pattern) {
            return Some(1000 + (pattern.len() * 8) as i64);
        }
        self.matcher.fuzzy_match(text, pattern)
    }

    /// Indices into `versions` that match `pattern`, best first. An empty
    /// pattern keeps the original order.
    pub fn filter(&self, pattern: &str, versions: &[String]) -> Vec<usize> {
        let mut ranked: Vec<(usize, i64)> = versions
            .iter()
            .enumerate()
            .filter_map(|(i, v)| self.score(pattern, v).map(|s| (i, s)))
            .collect();
        // Stable sort: equal scores keep listing order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.into_iter().map(|(i, _)| i).collect()
    }
}

impl Default for VersionMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions() -> Vec<String> {
        ["system", "3.10.9", "3.11.4", "3.11.4/envs/tools", "pypy3.10-7.3.12"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn empty_pattern_keeps_order() {
        let m = VersionMatcher::new();
        assert_eq!(m.filter("", &versions()), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn prefix_ranks_before_substring() {
        let m = VersionMatcher::new();
        let hits = m.filter("3.10", &versions());
        assert_eq!(hits[0], 1);
        assert!(hits.contains(&4));
        assert!(!hits.contains(&0));
    }

    #[test]
    fn fuzzy_fallback() {
        let m = VersionMatcher::new();
        assert!(m.score("sys", "system").is_some());
        assert!(m.score("tls", "3.11.4/envs/tools").is_some());
        assert!(m.score("xyz", "3.11.4").is_none());
    }
}
