//! `lastPatchedVersion`, persisted in the project's own `confsync.config.*` module.

use crate::ports::{ProjectFs, VersionStore};
use anyhow::Context;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use confsync_ast::{Dialect, Property, appender, export_shape, read_property, transform};
use confsync_domain::rules::supports_esm;
use confsync_types::ops::FileSet;
use semver::Version;
use tracing::{debug, warn};

/// Candidate config modules; the first one present wins.
pub const CONFIG_MODULES: [&str; 4] = [
    "confsync.config.ts",
    "confsync.config.js",
    "confsync.config.mjs",
    "confsync.config.cjs",
];

pub const VERSION_KEY: &str = "lastPatchedVersion";

const CREATED_CONFIG: &str = "confsync.config.js";

/// Reads and writes `lastPatchedVersion` through a [`ProjectFs`].
///
/// Reading an unparseable module yields no version. Writing to one is an error; the file is
/// never replaced wholesale.
pub struct ConfigModuleVersionStore<'a> {
    fs: &'a dyn ProjectFs,
}

impl<'a> ConfigModuleVersionStore<'a> {
    pub fn new(fs: &'a dyn ProjectFs) -> Self {
        Self { fs }
    }

    async fn find_module(&self) -> anyhow::Result<Option<(Utf8PathBuf, String)>> {
        for candidate in CONFIG_MODULES {
            let path = Utf8Path::new(candidate);
            if let Some(source) = self.fs.read(path).await? {
                return Ok(Some((path.to_path_buf(), source)));
            }
        }
        Ok(None)
    }

    async fn new_module(&self, version: &Version) -> anyhow::Result<String> {
        let path = Utf8Path::new(CREATED_CONFIG);
        let mut files = FileSet::new();
        if let Some(manifest) = self.fs.read(Utf8Path::new("package.json")).await? {
            files.insert(Utf8PathBuf::from("package.json"), manifest);
        }
        let export = if supports_esm(path, &files) {
            "export default"
        } else {
            "module.exports ="
        };
        Ok(format!(
            "{export} {{\n  {VERSION_KEY}: '{version}',\n}};\n"
        ))
    }
}

#[async_trait]
impl VersionStore for ConfigModuleVersionStore<'_> {
    async fn load(&self) -> anyhow::Result<Option<Version>> {
        let Some((path, source)) = self.find_module().await? else {
            debug!("no confsync config module; nothing patched yet");
            return Ok(None);
        };

        let property = match read_property(&source, Dialect::from_path(&path), VERSION_KEY) {
            Ok(property) => property,
            Err(err) => {
                warn!(path = %path, error = %err, "cannot parse config module; treating as unpatched");
                return Ok(None);
            }
        };
        let Some(raw) = property.as_ref().and_then(Property::string_value) else {
            return Ok(None);
        };
        match Version::parse(raw.trim()) {
            Ok(version) => Ok(Some(version)),
            Err(err) => {
                warn!(path = %path, value = %raw, error = %err, "invalid lastPatchedVersion; treating as unpatched");
                Ok(None)
            }
        }
    }

    async fn store(&self, version: &Version) -> anyhow::Result<()> {
        let Some((path, source)) = self.find_module().await? else {
            let created = self.new_module(version).await?;
            debug!(path = CREATED_CONFIG, version = %version, "creating config module");
            return self.fs.write(Utf8Path::new(CREATED_CONFIG), &created).await;
        };

        let dialect = Dialect::from_path(&path);
        let shape = export_shape(&source, dialect).with_context(|| format!("parse {}", path))?;
        if !shape.has_properties() {
            anyhow::bail!(
                "{} does not export a config object ({:?}); cannot record {}",
                path,
                shape,
                VERSION_KEY
            );
        }

        let updated = transform(
            &source,
            dialect,
            appender([Property::string(VERSION_KEY, &version.to_string())]),
        )
        .with_context(|| format!("rewrite {}", path))?;
        if updated == source {
            return Ok(());
        }
        self.fs.write(&path, &updated).await
    }
}
