//! Sequential step runner and concurrent batch reader.
//!
//! Ordered side effects go through [`run_sequentially`]: each step starts only after the
//! previous one finished. Reads of distinct paths may fan out through [`read_batch`].

use crate::ports::ProjectFs;
use camino::Utf8PathBuf;
use confsync_types::ops::FileSet;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::future::Future;

/// Fold `step` over `items` in order, threading `init` through every step.
pub async fn run_sequentially<I, S, F, Fut>(items: I, init: S, step: F) -> S
where
    I: IntoIterator,
    F: FnMut(S, I::Item) -> Fut,
    Fut: Future<Output = S>,
{
    stream::iter(items).fold(init, step).await
}

/// Read `paths` concurrently. Missing files are left out of the result.
pub async fn read_batch(fs: &dyn ProjectFs, paths: &[Utf8PathBuf]) -> anyhow::Result<FileSet> {
    let reads = paths
        .iter()
        .map(|path| async move { fs.read(path).await.map(|contents| (path, contents)) });

    let mut files = FileSet::new();
    for result in join_all(reads).await {
        if let (path, Some(contents)) = result? {
            files.insert(path.clone(), contents);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryFs;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn steps_run_in_order_and_thread_state() {
        let log = run_sequentially(["1.0.0", "1.1.0", "1.2.0"], Vec::new(), |mut log, v| async move {
            tokio::task::yield_now().await;
            log.push(v);
            log
        })
        .await;
        assert_eq!(log, vec!["1.0.0", "1.1.0", "1.2.0"]);
    }

    #[tokio::test]
    async fn batch_read_skips_missing_files() {
        let fs = InMemoryFs::from_entries([("a.js", "a"), ("c.js", "c")]);
        let files = read_batch(
            &fs,
            &["a.js".into(), "b.js".into(), "c.js".into()],
        )
        .await
        .unwrap();
        assert_eq!(
            files.keys().map(|p| p.as_str()).collect::<Vec<_>>(),
            vec!["a.js", "c.js"]
        );
    }
}
