use crate::matcher::{RuleError, RuleMatcher, RulePattern};
use camino::{Utf8Path, Utf8PathBuf};
use confsync_types::ops::{FileOperation, FileSet};
use std::collections::BTreeSet;
use std::fmt;

/// `(current, working, original) -> next`. `None` means the file is absent.
///
/// Transforms must be pure: they may read both sets but perform no I/O.
pub type TransformFn = dyn Fn(Option<&str>, &FileSet, &FileSet) -> Option<String> + Send + Sync;

/// A `(pattern, transform)` pair reconciling one kind of generated file.
pub struct ModuleRule {
    id: &'static str,
    pattern: RulePattern,
    transform: Box<TransformFn>,
}

impl ModuleRule {
    pub fn new<F>(id: &'static str, pattern: &str, transform: F) -> Result<Self, RuleError>
    where
        F: Fn(Option<&str>, &FileSet, &FileSet) -> Option<String> + Send + Sync + 'static,
    {
        Ok(Self {
            id,
            pattern: RulePattern::new(pattern)?,
            transform: Box::new(transform),
        })
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn pattern(&self) -> &RulePattern {
        &self.pattern
    }

    pub fn apply(&self, current: Option<&str>, working: &FileSet, original: &FileSet) -> Option<String> {
        (self.transform)(current, working, original)
    }
}

impl fmt::Debug for ModuleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRule")
            .field("id", &self.id)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// Ordered rule table plus the diff engine that runs it over a virtual file set.
#[derive(Debug)]
pub struct RuleRegistry {
    rules: Vec<ModuleRule>,
    matcher: RuleMatcher,
    exclude: Option<RuleMatcher>,
}

impl RuleRegistry {
    pub fn new(rules: Vec<ModuleRule>) -> Result<Self, RuleError> {
        let matcher = RuleMatcher::new(rules.iter().map(|r| r.pattern.as_str()))?;
        Ok(Self {
            rules,
            matcher,
            exclude: None,
        })
    }

    /// Paths matching any of `patterns` are never touched.
    pub fn with_exclude<'a>(mut self, patterns: impl IntoIterator<Item = &'a str>) -> Result<Self, RuleError> {
        let exclude = RuleMatcher::new(patterns)?;
        self.exclude = (!exclude.is_empty()).then_some(exclude);
        Ok(self)
    }

    pub fn rules(&self) -> &[ModuleRule] {
        &self.rules
    }

    /// Rules applicable to `path`, in registration order.
    pub fn rules_for(&self, path: &Utf8Path) -> Vec<&ModuleRule> {
        if self.is_excluded(path) {
            return Vec::new();
        }
        self.matcher
            .matching(path)
            .into_iter()
            .filter_map(|i| self.rules.get(i))
            .collect()
    }

    /// Whether a file on disk is of interest to at least one rule.
    pub fn is_candidate(&self, path: &Utf8Path) -> bool {
        !self.is_excluded(path) && self.matcher.is_match(path)
    }

    /// Literal rule paths that rules may create, minus excluded ones. Sorted.
    pub fn implied_paths(&self) -> Vec<Utf8PathBuf> {
        let paths: BTreeSet<Utf8PathBuf> = self
            .rules
            .iter()
            .filter_map(|r| r.pattern.implied_path())
            .filter(|p| !self.is_excluded(p))
            .collect();
        paths.into_iter().collect()
    }

    fn is_excluded(&self, path: &Utf8Path) -> bool {
        self.exclude.as_ref().is_some_and(|e| e.is_match(path))
    }

    /// Run every rule over `initial` and return the operations that turn it into the target.
    ///
    /// Rules run in registration order; each sees the cumulative working set and the pristine
    /// original. Paths are visited in sorted order, so the result depends only on the rules
    /// and `initial`. Paths whose final content equals the original produce nothing.
    pub fn diff(&self, initial: &FileSet) -> Vec<FileOperation> {
        let mut working = initial.clone();
        let mut universe: BTreeSet<Utf8PathBuf> = initial.keys().cloned().collect();

        for rule in &self.rules {
            if let Some(implied) = rule.pattern.implied_path()
                && !self.is_excluded(&implied)
            {
                universe.insert(implied);
            }

            let targets: Vec<Utf8PathBuf> = universe
                .iter()
                .filter(|p| rule.pattern.is_match(p) && !self.is_excluded(p))
                .cloned()
                .collect();

            for path in targets {
                let current = working.get(&path).cloned();
                let next = rule.apply(current.as_deref(), &working, initial);
                if next != current {
                    tracing::debug!(rule = rule.id, path = %path, "rule changed file");
                }
                match next {
                    Some(content) => {
                        working.insert(path, content);
                    }
                    None => {
                        working.remove(&path);
                    }
                }
            }
        }

        let mut ops = Vec::new();
        for path in universe {
            match (initial.get(&path), working.remove(&path)) {
                (Some(_), None) => ops.push(FileOperation::delete(path)),
                (None, Some(content)) => ops.push(FileOperation::add(path, content)),
                (Some(before), Some(after)) if *before != after => {
                    ops.push(FileOperation::modify(path, after))
                }
                _ => {}
            }
        }
        ops
    }
}

/// Apply `ops` to a snapshot in memory, yielding the state a write pass would leave on disk.
pub fn apply_to_file_set(files: &FileSet, ops: &[FileOperation]) -> FileSet {
    let mut out = files.clone();
    for op in ops {
        match &op.content {
            Some(content) => {
                out.insert(op.path.clone(), content.clone());
            }
            None => {
                out.remove(&op.path);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use confsync_types::ops::FileOpKind;
    use pretty_assertions::assert_eq;

    fn files(entries: &[(&str, &str)]) -> FileSet {
        entries
            .iter()
            .map(|(p, c)| (Utf8PathBuf::from(*p), c.to_string()))
            .collect()
    }

    #[test]
    fn literal_rule_creates_file() {
        let registry = RuleRegistry::new(vec![
            ModuleRule::new("nvmrc", ".nvmrc", |cur, _, _| {
                Some(cur.unwrap_or("22\n").to_string())
            })
            .unwrap(),
        ])
        .unwrap();
        let ops = registry.diff(&FileSet::new());
        assert_eq!(ops, vec![FileOperation::add(".nvmrc", "22\n".to_string())]);
    }

    #[test]
    fn implied_paths_skip_globs_and_excludes() {
        let registry = RuleRegistry::new(vec![
            ModuleRule::new("nvmrc", ".nvmrc", |cur, _, _| cur.map(str::to_string)).unwrap(),
            ModuleRule::new("legacy", ".eslintrc.{js,json}", |_, _, _| None).unwrap(),
            ModuleRule::new("npmrc", ".npmrc", |cur, _, _| cur.map(str::to_string)).unwrap(),
        ])
        .unwrap()
        .with_exclude([".npmrc"])
        .unwrap();
        assert_eq!(registry.implied_paths(), vec![Utf8PathBuf::from(".nvmrc")]);
    }

    #[test]
    fn absent_result_deletes_original() {
        let registry = RuleRegistry::new(vec![
            ModuleRule::new("legacy", ".eslintrc.{js,json}", |_, _, _| None).unwrap(),
        ])
        .unwrap();
        let ops = registry.diff(&files(&[(".eslintrc.json", "{}"), ("keep.txt", "x")]));
        assert_eq!(ops, vec![FileOperation::delete(".eslintrc.json")]);
    }

    #[test]
    fn later_rules_see_earlier_output_and_pristine_original() {
        let registry = RuleRegistry::new(vec![
            ModuleRule::new("create", "new.txt", |_, _, _| Some("new".to_string())).unwrap(),
            ModuleRule::new("observe", "log.txt", |_, working, original| {
                Some(format!(
                    "working={} original={}",
                    working.contains_key(Utf8Path::new("new.txt")),
                    original.contains_key(Utf8Path::new("new.txt"))
                ))
            })
            .unwrap(),
        ])
        .unwrap();
        let ops = registry.diff(&files(&[("log.txt", "")]));
        let log = ops
            .iter()
            .find(|op| op.path.as_str() == "log.txt")
            .and_then(|op| op.content.clone());
        assert_eq!(log.as_deref(), Some("working=true original=false"));
    }

    #[test]
    fn rules_thread_content_in_registration_order() {
        let registry = RuleRegistry::new(vec![
            ModuleRule::new("a", "f.txt", |cur, _, _| cur.map(|c| format!("{c}a"))).unwrap(),
            ModuleRule::new("b", "*.txt", |cur, _, _| cur.map(|c| format!("{c}b"))).unwrap(),
        ])
        .unwrap();
        let ops = registry.diff(&files(&[("f.txt", ">")]));
        assert_eq!(ops, vec![FileOperation::modify("f.txt", ">ab".to_string())]);
        assert_eq!(ops[0].kind, FileOpKind::Modify);
    }

    #[test]
    fn unchanged_paths_emit_nothing() {
        let registry = RuleRegistry::new(vec![
            ModuleRule::new("id", "*", |cur, _, _| cur.map(str::to_string)).unwrap(),
        ])
        .unwrap();
        assert!(registry.diff(&files(&[("a", "1"), ("b", "2")])).is_empty());
    }

    #[test]
    fn excluded_paths_are_skipped() {
        let registry = RuleRegistry::new(vec![
            ModuleRule::new("gone", "*.txt", |_, _, _| None).unwrap(),
        ])
        .unwrap()
        .with_exclude(["keep.txt"])
        .unwrap();
        let ops = registry.diff(&files(&[("keep.txt", "x"), ("drop.txt", "y")]));
        assert_eq!(ops, vec![FileOperation::delete("drop.txt")]);
        assert!(!registry.is_candidate(Utf8Path::new("keep.txt")));
        assert!(registry.rules_for(Utf8Path::new("keep.txt")).is_empty());
    }
}
