use confsync_types::deps::{DependencyDiff, DependencyDiffMap, DependencyOperation, DependencyReport};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Package name to version. `None` means "no opinion" and is never reported as a change.
pub type DependencyMap = BTreeMap<String, Option<String>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    #[default]
    Application,
    Package,
}

impl ProjectType {
    pub fn is_package(self) -> bool {
        self == ProjectType::Package
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    pub dependencies: DependencyMap,
    pub dev_dependencies: DependencyMap,
    pub project_type: ProjectType,
}

impl DependencySet {
    /// Read `dependencies` and `devDependencies` out of a `package.json` value.
    pub fn from_manifest(manifest: &Value, project_type: ProjectType) -> Self {
        Self {
            dependencies: read_section(manifest.get("dependencies")),
            dev_dependencies: read_section(manifest.get("devDependencies")),
            project_type,
        }
    }

    /// Write both sections back into `manifest`. Sections that did not change are left as
    /// they are; changed sections are rewritten in name order. Empty sections are removed.
    pub fn write_to_manifest(&self, manifest: &mut Value) {
        let Some(obj) = manifest.as_object_mut() else {
            return;
        };
        write_section(obj, "dependencies", &self.dependencies);
        write_section(obj, "devDependencies", &self.dev_dependencies);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name) || self.dev_dependencies.contains_key(name)
    }
}

fn read_section(section: Option<&Value>) -> DependencyMap {
    section
        .and_then(Value::as_object)
        .map(|deps| {
            deps.iter()
                .map(|(name, v)| (name.clone(), v.as_str().map(str::to_string)))
                .collect()
        })
        .unwrap_or_default()
}

fn write_section(obj: &mut Map<String, Value>, section: &str, deps: &DependencyMap) {
    if &read_section(obj.get(section)) == deps {
        return;
    }
    if deps.is_empty() {
        obj.remove(section);
        return;
    }

    let previous = obj.get(section).and_then(Value::as_object).cloned().unwrap_or_default();
    let mut out = Map::new();
    for (name, version) in deps {
        let value = match version {
            Some(v) => Value::String(v.clone()),
            // Keep whatever non-string value was there.
            None => previous.get(name).cloned().unwrap_or(Value::Null),
        };
        out.insert(name.clone(), value);
    }
    obj.insert(section.to_string(), Value::Object(out));
}

/// Compare two dependency maps.
///
/// `A` when a name is absent in `old`, `D` when absent in `new`, `M` when both carry different
/// versions. Names whose versions are equal, or where either side has no opinion, are omitted.
pub fn diff_dependencies(old: &DependencyMap, new: &DependencyMap) -> DependencyDiffMap {
    let names: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    let mut out = DependencyDiffMap::new();

    for name in names {
        let diff = match (old.get(name), new.get(name)) {
            (None, Some(Some(v))) => DependencyDiff {
                operation: DependencyOperation::Added,
                version: v.clone(),
            },
            (Some(Some(v)), None) => DependencyDiff {
                operation: DependencyOperation::Deleted,
                version: v.clone(),
            },
            (Some(Some(a)), Some(Some(b))) if a != b => DependencyDiff {
                operation: DependencyOperation::Modified,
                version: format!("{a} -> {b}"),
            },
            _ => continue,
        };
        out.insert(name.clone(), diff);
    }
    out
}

/// Per-section diff of two dependency sets.
pub fn diff_dependency_sets(old: &DependencySet, new: &DependencySet) -> DependencyReport {
    DependencyReport {
        dependencies: diff_dependencies(&old.dependencies, &new.dependencies),
        dev_dependencies: diff_dependencies(&old.dev_dependencies, &new.dev_dependencies),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: String,
    pub to: String,
    /// Version for the new name; `None` carries the old version over.
    pub version: Option<String>,
}

/// Data-driven dependency migrations applied to a [`DependencySet`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMigrations {
    pub renames: Vec<Rename>,
    /// Packages that belong in `devDependencies` of an application.
    pub dev_only: Vec<String>,
}

impl DependencyMigrations {
    pub fn rename(mut self, from: &str, to: &str, version: Option<&str>) -> Self {
        self.renames.push(Rename {
            from: from.to_string(),
            to: to.to_string(),
            version: version.map(str::to_string),
        });
        self
    }

    pub fn dev_only(mut self, name: &str) -> Self {
        self.dev_only.push(name.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty() && self.dev_only.is_empty()
    }
}

/// Apply `migrations` to `set` in place and report what changed.
pub fn migrate_dependencies(
    set: &mut DependencySet,
    migrations: &DependencyMigrations,
) -> DependencyReport {
    let before = set.clone();

    for rename in &migrations.renames {
        for section in [&mut set.dependencies, &mut set.dev_dependencies] {
            if let Some(old_version) = section.remove(&rename.from) {
                let version = rename.version.clone().or(old_version);
                tracing::debug!(from = %rename.from, to = %rename.to, "renamed dependency");
                section.entry(rename.to.clone()).or_insert(version);
            }
        }
    }

    if set.project_type == ProjectType::Application {
        for name in &migrations.dev_only {
            if let Some(version) = set.dependencies.remove(name) {
                tracing::debug!(package = %name, "moved to devDependencies");
                set.dev_dependencies.entry(name.clone()).or_insert(version);
            }
        }
    }

    diff_dependency_sets(&before, set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn map(entries: &[(&str, Option<&str>)]) -> DependencyMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn diff_reports_modified_versions() {
        let diff = diff_dependencies(
            &map(&[("lodash", Some("1.0.0"))]),
            &map(&[("lodash", Some("1.0.1"))]),
        );
        assert_eq!(diff.len(), 1);
        assert_eq!(diff["lodash"].operation, DependencyOperation::Modified);
        assert_eq!(diff["lodash"].version, "1.0.0 -> 1.0.1");
    }

    #[test]
    fn diff_of_empty_maps_is_empty() {
        assert!(diff_dependencies(&map(&[]), &map(&[])).is_empty());
    }

    #[test]
    fn diff_reports_added_and_deleted() {
        let diff = diff_dependencies(
            &map(&[("left-pad", Some("1.3.0"))]),
            &map(&[("react", Some("^19.0.0"))]),
        );
        assert_eq!(diff["left-pad"].operation, DependencyOperation::Deleted);
        assert_eq!(diff["left-pad"].version, "1.3.0");
        assert_eq!(diff["react"].operation, DependencyOperation::Added);
    }

    #[test]
    fn no_opinion_is_not_a_change() {
        let diff = diff_dependencies(
            &map(&[("a", None), ("b", Some("1"))]),
            &map(&[("a", Some("2")), ("b", None), ("c", None)]),
        );
        assert!(diff.is_empty());
    }

    #[test]
    fn renames_keep_version_unless_given() {
        let mut set = DependencySet {
            dependencies: map(&[("old-lib", Some("^1.0.0"))]),
            dev_dependencies: map(&[("old-tool", Some("^2.0.0"))]),
            project_type: ProjectType::Package,
        };
        let migrations = DependencyMigrations::default()
            .rename("old-lib", "new-lib", None)
            .rename("old-tool", "new-tool", Some("^3.0.0"));
        let report = migrate_dependencies(&mut set, &migrations);

        assert_eq!(set.dependencies, map(&[("new-lib", Some("^1.0.0"))]));
        assert_eq!(set.dev_dependencies, map(&[("new-tool", Some("^3.0.0"))]));
        assert_eq!(report.dependencies["old-lib"].operation, DependencyOperation::Deleted);
        assert_eq!(report.dependencies["new-lib"].operation, DependencyOperation::Added);
    }

    #[test]
    fn dev_only_moves_only_for_applications() {
        let migrations = DependencyMigrations::default().dev_only("confsync");
        let deps = map(&[("confsync", Some("^2.0.0"))]);

        let mut app = DependencySet {
            dependencies: deps.clone(),
            project_type: ProjectType::Application,
            ..Default::default()
        };
        migrate_dependencies(&mut app, &migrations);
        assert!(app.dependencies.is_empty());
        assert_eq!(app.dev_dependencies, deps);

        let mut pkg = DependencySet {
            dependencies: deps.clone(),
            project_type: ProjectType::Package,
            ..Default::default()
        };
        let report = migrate_dependencies(&mut pkg, &migrations);
        assert!(report.is_empty());
        assert_eq!(pkg.dependencies, deps);
    }

    #[test]
    fn manifest_round_trip_leaves_unchanged_sections_alone() {
        let mut manifest = json!({
            "name": "app",
            "dependencies": {"zod": "^3.0.0", "axios": "^1.0.0"},
            "devDependencies": {"old-tool": "^1.0.0"}
        });
        let mut set = DependencySet::from_manifest(&manifest, ProjectType::Application);
        migrate_dependencies(
            &mut set,
            &DependencyMigrations::default().rename("old-tool", "new-tool", None),
        );
        set.write_to_manifest(&mut manifest);

        // Unchanged section keeps its original key order.
        let deps: Vec<&str> = manifest["dependencies"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(deps, vec!["zod", "axios"]);
        assert_eq!(manifest["devDependencies"], json!({"new-tool": "^1.0.0"}));
    }
}
