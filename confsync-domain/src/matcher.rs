use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid glob {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

fn compile(pattern: &str) -> Result<Glob, RuleError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .empty_alternates(true)
        .build()
        .map_err(|source| RuleError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn is_literal(pattern: &str) -> bool {
    !pattern.contains(['*', '?', '[', ']', '{', '}'])
}

/// A compiled rule pattern.
#[derive(Debug, Clone)]
pub struct RulePattern {
    source: String,
    matcher: GlobMatcher,
}

impl RulePattern {
    pub fn new(pattern: &str) -> Result<Self, RuleError> {
        Ok(Self {
            source: pattern.to_string(),
            matcher: compile(pattern)?.compile_matcher(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, path: &Utf8Path) -> bool {
        self.matcher.is_match(path.as_str())
    }

    /// A pattern without glob metacharacters names exactly one path, which may not exist yet.
    pub fn implied_path(&self) -> Option<Utf8PathBuf> {
        is_literal(&self.source).then(|| Utf8PathBuf::from(&self.source))
    }
}

/// Maps a path to the ordered set of rules whose pattern matches it.
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    set: GlobSet,
}

impl RuleMatcher {
    pub fn new<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<Self, RuleError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(compile(pattern)?);
        }
        let set = builder.build().map_err(|source| RuleError::InvalidPattern {
            pattern: "<set>".to_string(),
            source,
        })?;
        Ok(Self { set })
    }

    /// Indices of matching patterns, in registration order.
    pub fn matching(&self, path: &Utf8Path) -> Vec<usize> {
        let mut idx = self.set.matches(path.as_str());
        idx.sort_unstable();
        idx
    }

    pub fn is_match(&self, path: &Utf8Path) -> bool {
        self.set.is_match(path.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn braces_expand_alternatives() {
        let p = RulePattern::new("jest.config.{js,ts,cjs,mjs}").unwrap();
        assert!(p.is_match(Utf8Path::new("jest.config.ts")));
        assert!(p.is_match(Utf8Path::new("jest.config.mjs")));
        assert!(!p.is_match(Utf8Path::new("jest.config.json")));
        assert!(p.implied_path().is_none());
    }

    #[test]
    fn star_does_not_cross_directories() {
        let p = RulePattern::new("*.json").unwrap();
        assert!(p.is_match(Utf8Path::new("package.json")));
        assert!(!p.is_match(Utf8Path::new("packages/a/package.json")));
    }

    #[test]
    fn literal_patterns_imply_their_path() {
        let p = RulePattern::new(".nvmrc").unwrap();
        assert_eq!(p.implied_path(), Some(Utf8PathBuf::from(".nvmrc")));
    }

    #[test]
    fn matcher_reports_rules_in_registration_order() {
        let m = RuleMatcher::new(["*.json", "package.json", "tsconfig.json"]).unwrap();
        assert_eq!(m.matching(Utf8Path::new("package.json")), vec![0, 1]);
        assert_eq!(m.matching(Utf8Path::new("tsconfig.json")), vec![0, 2]);
        assert!(m.matching(Utf8Path::new(".nvmrc")).is_empty());
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let err = RulePattern::new("a/[").unwrap_err();
        assert!(err.to_string().contains("a/["));
    }
}
