use crate::{AssetFile, hash_asset};
use hashmark_core::prelude::*;
use tracing::error;

/// Iterator stage that hashes each file. See [`hash_files`].
pub struct HashFiles<'a, S, I> {
    hasher: &'a AssetHasher<S>,
    inner: I,
    options: ConfigPatch,
}

/// Hash every file coming out of `files`.
///
/// A failing file yields an `Err` for that item only; iteration continues.
pub fn hash_files<S, I>(hasher: &AssetHasher<S>, files: I, options: ConfigPatch) -> HashFiles<'_, S, I::IntoIter>
where
    S: AssetStorage,
    I: IntoIterator<Item = AssetFile>,
{
    HashFiles {
        hasher,
        inner: files.into_iter(),
        options,
    }
}

impl<S, I> Iterator for HashFiles<'_, S, I>
where
    S: AssetStorage,
    I: Iterator<Item = AssetFile>,
{
    type Item = Result<AssetFile>;

    fn next(&mut self) -> Option<Self::Item> {
        let file = self.inner.next()?;
        Some(hash_asset(self.hasher, file, &self.options))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Pass-through stage that rewrites the manifest whenever a hashed file goes
/// by. See [`save_manifest_stage`].
pub struct SaveManifestStage<'a, S, I> {
    hasher: &'a AssetHasher<S>,
    inner: I,
    options: ConfigPatch,
}

/// Write the manifest (merging) after every hashed file in `files`.
///
/// Errors from upstream are forwarded unchanged. A manifest failure is
/// yielded in place of the file that triggered it.
pub fn save_manifest_stage<S, I>(
    hasher: &AssetHasher<S>,
    files: I,
    options: ConfigPatch,
) -> SaveManifestStage<'_, S, I::IntoIter>
where
    S: AssetStorage,
    I: IntoIterator<Item = Result<AssetFile>>,
{
    SaveManifestStage {
        hasher,
        inner: files.into_iter(),
        options,
    }
}

impl<S, I> Iterator for SaveManifestStage<'_, S, I>
where
    S: AssetStorage,
    I: Iterator<Item = Result<AssetFile>>,
{
    type Item = Result<AssetFile>;

    fn next(&mut self) -> Option<Self::Item> {
        let file = match self.inner.next()? {
            Ok(file) => file,
            Err(e) => return Some(Err(e)),
        };
        if !file.asset_hashed {
            return Some(Ok(file));
        }

        match self
            .hasher
            .save_manifest(self.options.clone(), ManifestMode::Merge)
        {
            Ok(_) => Some(Ok(file)),
            Err(e) => {
                error!("Failed to save manifest after {}: {e}", file.path.display());
                Some(Err(e))
            }
        }
    }
}
