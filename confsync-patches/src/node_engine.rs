use anyhow::Context;
use async_trait::async_trait;
use camino::Utf8Path;
use confsync_core::{Patch, PatchContext, PatchMeta, PatchResult};
use confsync_domain::rules::write_json_like;
use confsync_merge::merge;
use semver::Version;
use serde_json::json;

/// Declares the supported Node.js range in `package.json` when the project has none.
pub struct NodeEnginePatch {
    node_version: String,
}

impl NodeEnginePatch {
    pub fn new(node_version: &str) -> Self {
        Self {
            node_version: node_version.to_string(),
        }
    }
}

#[async_trait]
impl Patch for NodeEnginePatch {
    fn meta(&self) -> PatchMeta {
        PatchMeta::new(
            Version::new(2, 2, 0),
            "Declare the Node.js engine in package.json",
        )
    }

    async fn apply(&self, ctx: &PatchContext<'_>) -> anyhow::Result<PatchResult> {
        let Some(manifest) = &ctx.manifest else {
            return Ok(PatchResult::skip("no readable package.json"));
        };
        if manifest.pointer("/engines/node").is_some() {
            return Ok(PatchResult::skip("engines.node is already declared"));
        }

        if ctx.mode.is_format() {
            let overlay = json!({ "engines": { "node": format!(">={}", self.node_version) } });
            let raw = ctx.manifest_text().await?;
            let updated = write_json_like(&merge(manifest, &overlay), &raw)
                .context("serialize package.json")?;
            ctx.fs.write(Utf8Path::new("package.json"), &updated).await?;
        }
        Ok(PatchResult::Apply)
    }
}
