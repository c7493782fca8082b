use crate::{AssetFile, hash_asset};
use futures::{Stream, StreamExt};
use hashmark_core::prelude::*;
use std::sync::Arc;

/// Hash every file of `files`, in order.
///
/// Hashing does blocking I/O, so each file is handed to
/// [`tokio::task::spawn_blocking`]. Must be polled inside a tokio runtime.
pub fn hash_stream<S, St>(
    hasher: Arc<AssetHasher<S>>,
    files: St,
    options: ConfigPatch,
) -> impl Stream<Item = Result<AssetFile>>
where
    S: AssetStorage,
    St: Stream<Item = AssetFile>,
{
    files.then(move |file| {
        let hasher = Arc::clone(&hasher);
        let options = options.clone();
        async move {
            tokio::task::spawn_blocking(move || hash_asset(&hasher, file, &options))
                .await
                .map_err(|e| HashError::Pipeline(format!("hashing task failed: {e}")))?
        }
    })
}
