use anyhow::Context;
use async_trait::async_trait;
use camino::Utf8Path;
use confsync_core::{Patch, PatchContext, PatchMeta, PatchResult};
use confsync_domain::rules::write_json_like;
use semver::Version;
use serde_json::Value;

/// Drops the `confsync.lint` key from `package.json`; lint settings moved to
/// `confsync.config.*`. Reinstalls afterwards so the lockfile matches the manifest.
pub struct RemoveLintKeyPatch;

#[async_trait]
impl Patch for RemoveLintKeyPatch {
    fn meta(&self) -> PatchMeta {
        PatchMeta::new(
            Version::new(2, 3, 0),
            "Remove deprecated `confsync.lint` key from package.json",
        )
    }

    async fn apply(&self, ctx: &PatchContext<'_>) -> anyhow::Result<PatchResult> {
        let Some(manifest) = &ctx.manifest else {
            return Ok(PatchResult::skip("no readable package.json"));
        };
        if manifest.pointer("/confsync/lint").is_none() {
            return Ok(PatchResult::skip("no `confsync.lint` key"));
        }
        if ctx.mode.is_lint() {
            return Ok(PatchResult::Apply);
        }

        let mut updated = manifest.clone();
        let section_empty = match updated.get_mut("confsync") {
            Some(Value::Object(section)) => {
                section.shift_remove("lint");
                section.is_empty()
            }
            _ => false,
        };
        if section_empty && let Some(root) = updated.as_object_mut() {
            root.shift_remove("confsync");
        }

        let raw = ctx.manifest_text().await?;
        let text = write_json_like(&updated, &raw).context("serialize package.json")?;
        ctx.fs.write(Utf8Path::new("package.json"), &text).await?;
        ctx.install().await.context("reinstall dependencies")?;
        Ok(PatchResult::Apply)
    }
}
