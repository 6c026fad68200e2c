use confsync_merge::{DependencyMigrations, ProjectType};
use serde_json::{Value, json};

/// Canonical template content the built-in rules reconcile a project against.
#[derive(Debug, Clone)]
pub struct Template {
    pub project_type: ProjectType,
    pub node_version: String,
    pub gitignore: Vec<String>,
    pub prettierignore: Vec<String>,
    pub npmignore: Vec<String>,
    /// `scripts` / `engines` defaults merged into `package.json`.
    pub package_json: Value,
    pub compiler_options: Value,
    pub eslint_config: String,
    pub jest_preset: String,
    /// Prettier options the tool still supports; others are dropped from prettier configs.
    pub prettier_keys: Vec<String>,
    pub migrations: DependencyMigrations,
}

pub const TOOL_PACKAGE: &str = "confsync";

pub const DEFAULT_NODE_VERSION: &str = "22";

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Template {
    pub fn builtin(project_type: ProjectType, node_version: &str) -> Self {
        let mut package_json = json!({
            "scripts": {
                "lint": "confsync lint",
                "format": "confsync format",
            },
            "engines": {
                "node": format!(">={node_version}"),
            },
        });
        if project_type.is_package()
            && let Some(scripts) = package_json.get_mut("scripts").and_then(Value::as_object_mut)
        {
            scripts.insert("prepublishOnly".to_string(), json!("confsync lint"));
        }

        let mut npmignore = lines(&["src/", "tsconfig.json", "*.test.ts", "coverage/"]);
        if !project_type.is_package() {
            npmignore.clear();
        }

        Self {
            project_type,
            node_version: node_version.to_string(),
            gitignore: lines(&["node_modules/", "dist/", "coverage/", ".env", "*.log"]),
            prettierignore: lines(&["node_modules/", "dist/", "coverage/", "package-lock.json", "pnpm-lock.yaml"]),
            npmignore,
            package_json,
            compiler_options: json!({
                "strict": true,
                "esModuleInterop": true,
                "skipLibCheck": true,
                "forceConsistentCasingInFileNames": true,
            }),
            eslint_config: "import confsync from 'confsync/eslint';\n\nexport default [...confsync];\n"
                .to_string(),
            jest_preset: "ts-jest".to_string(),
            prettier_keys: lines(&[
                "printWidth",
                "tabWidth",
                "useTabs",
                "semi",
                "singleQuote",
                "quoteProps",
                "jsxSingleQuote",
                "trailingComma",
                "bracketSpacing",
                "arrowParens",
                "endOfLine",
                "overrides",
            ]),
            migrations: DependencyMigrations::default()
                .rename("confsync-cli", TOOL_PACKAGE, None)
                .rename("eslint-config-confsync", TOOL_PACKAGE, None)
                .dev_only(TOOL_PACKAGE),
        }
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::builtin(ProjectType::Application, DEFAULT_NODE_VERSION)
    }
}
