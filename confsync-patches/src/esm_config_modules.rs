use async_trait::async_trait;
use camino::Utf8PathBuf;
use confsync_ast::{Dialect, normalize_module_syntax};
use confsync_core::tasks::read_batch;
use confsync_core::version::CONFIG_MODULES;
use confsync_core::{Patch, PatchContext, PatchMeta, PatchResult};
use confsync_domain::rules::{ESLINT_FLAT_CONFIGS, JEST_CONFIGS, PRETTIER_CONFIGS, supports_esm};
use semver::Version;
use tracing::{debug, warn};

/// Rewrites `require`/`module.exports` in config modules that may use ES module syntax.
pub struct EsmConfigModulesPatch;

impl EsmConfigModulesPatch {
    fn candidates() -> Vec<Utf8PathBuf> {
        ESLINT_FLAT_CONFIGS
            .iter()
            .chain(JEST_CONFIGS.iter())
            .chain(PRETTIER_CONFIGS.iter())
            .chain(CONFIG_MODULES.iter())
            .chain(["package.json"].iter())
            .map(Utf8PathBuf::from)
            .collect()
    }
}

#[async_trait]
impl Patch for EsmConfigModulesPatch {
    fn meta(&self) -> PatchMeta {
        PatchMeta::new(
            Version::new(2, 0, 0),
            "Convert CommonJS config modules to ES module syntax",
        )
    }

    async fn apply(&self, ctx: &PatchContext<'_>) -> anyhow::Result<PatchResult> {
        let files = read_batch(ctx.fs, &Self::candidates()).await?;

        let mut rewrites = Vec::new();
        for (path, source) in &files {
            if path.extension() == Some("json") || !supports_esm(path, &files) {
                continue;
            }
            match normalize_module_syntax(source, Dialect::from_path(path)) {
                Ok(normalized) if normalized != *source => rewrites.push((path, normalized)),
                Ok(_) => {}
                Err(err) => warn!(path = %path, error = %err, "cannot parse config module; leaving as is"),
            }
        }

        if rewrites.is_empty() {
            return Ok(PatchResult::skip("no CommonJS config modules to convert"));
        }
        if ctx.mode.is_format() {
            for (path, normalized) in &rewrites {
                debug!(path = %path, "converting to ES module syntax");
                ctx.fs.write(path, normalized).await?;
            }
        }
        Ok(PatchResult::Apply)
    }
}
