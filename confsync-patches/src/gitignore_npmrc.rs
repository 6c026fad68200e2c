use async_trait::async_trait;
use camino::Utf8Path;
use confsync_core::{Patch, PatchContext, PatchMeta, PatchResult};
use confsync_domain::rules::append_missing_lines;
use semver::Version;

/// Keeps registry credentials in `.npmrc` out of version control.
pub struct GitignoreNpmrcPatch;

impl GitignoreNpmrcPatch {
    const GITIGNORE: &'static str = ".gitignore";
}

#[async_trait]
impl Patch for GitignoreNpmrcPatch {
    fn meta(&self) -> PatchMeta {
        PatchMeta::new(Version::new(2, 1, 0), "Ignore .npmrc in .gitignore")
    }

    async fn apply(&self, ctx: &PatchContext<'_>) -> anyhow::Result<PatchResult> {
        if !ctx.fs.exists(Utf8Path::new(".git")).await {
            return Ok(PatchResult::skip("no git repository at the project root"));
        }

        let path = Utf8Path::new(Self::GITIGNORE);
        let current = ctx.fs.read(path).await?;
        let updated = append_missing_lines(current.as_deref(), &[".npmrc".to_string()]);
        match updated {
            Some(updated) if current.as_deref() != Some(updated.as_str()) => {
                if ctx.mode.is_format() {
                    ctx.fs.write(path, &updated).await?;
                }
                Ok(PatchResult::Apply)
            }
            _ => Ok(PatchResult::skip(".npmrc is already ignored")),
        }
    }
}
