use std::path::{Path, PathBuf};

use bytes::Bytes;
use palaver_core::avatar::{default_avatar_hash, IMMUTABLE_CACHE_CONTROL};

use crate::CdnError;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A default avatar ready to be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub bytes: Bytes,
    /// Sniffed from the bytes, not from any file name.
    pub content_type: String,
    pub cache_control: &'static str,
}

/// Serves the built-in default avatars from the assets root.
///
/// An avatar's hash names either a single file (`<hash>.png`, or a bare
/// `<hash>`) or a directory of pre-rendered variants, in which case the
/// first entry by name is served.
#[derive(Debug, Clone)]
pub struct AvatarResolver {
    assets_root: PathBuf,
}

impl AvatarResolver {
    pub fn new(assets_root: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
        }
    }

    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    pub async fn resolve(&self, id: &str) -> Result<ResolvedAsset, CdnError> {
        let hash =
            default_avatar_hash(id).ok_or_else(|| CdnError::NotFound(format!("avatar {id}")))?;

        let candidates = [
            self.assets_root.join(format!("{hash}.png")),
            self.assets_root.join(hash),
        ];
        for path in &candidates {
            if let Some(bytes) = read_file_or_first_entry(path).await {
                return Ok(ResolvedAsset {
                    content_type: sniff_content_type(&bytes).to_string(),
                    bytes,
                    cache_control: IMMUTABLE_CACHE_CONTROL,
                });
            }
        }

        tracing::debug!(id, hash, "no backing file for default avatar");
        Err(CdnError::NotFound(format!("avatar {id}")))
    }
}

/// Best-effort MIME type from the leading bytes.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|t| t.mime_type())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

/// Read `path` if it is a file; if it is a directory, read its first regular
/// file by name. Anything missing or unreadable yields `None`.
async fn read_file_or_first_entry(path: &Path) -> Option<Bytes> {
    let meta = tokio::fs::metadata(path).await.ok()?;
    if meta.is_file() {
        return read(path).await;
    }
    if !meta.is_dir() {
        return None;
    }

    let mut entries = tokio::fs::read_dir(path).await.ok()?;
    let mut files = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        match entry.file_type().await {
            Ok(ft) if ft.is_file() => files.push(entry.path()),
            _ => {}
        }
    }
    files.sort();
    read(files.first()?).await
}

async fn read(path: &Path) -> Option<Bytes> {
    match tokio::fs::read(path).await {
        Ok(data) => Some(Bytes::from(data)),
        Err(e) => {
            tracing::warn!(path = %path.display(), "read failed: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const HASH_2: &str = "7c8f476123d28d103efe381543274c25";

    fn png_bytes(tail: &[u8]) -> Vec<u8> {
        let mut v = PNG_MAGIC.to_vec();
        v.extend_from_slice(tail);
        v
    }

    #[tokio::test]
    async fn resolves_single_file_and_ignores_extension() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(format!("{HASH_2}.png")), png_bytes(b"x")).unwrap();
        let resolver = AvatarResolver::new(tmp.path());

        let plain = resolver.resolve("2").await.unwrap();
        let with_ext = resolver.resolve("2.anything").await.unwrap();
        assert_eq!(plain, with_ext);
        assert_eq!(plain.bytes.as_ref(), png_bytes(b"x").as_slice());
        assert_eq!(plain.content_type, "image/png");
        assert_eq!(plain.cache_control, "public, max-age=31536000");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let resolver = AvatarResolver::new(tmp.path());
        assert!(matches!(
            resolver.resolve("9").await.unwrap_err(),
            CdnError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn known_id_without_backing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let resolver = AvatarResolver::new(tmp.path());
        assert!(matches!(
            resolver.resolve("0").await.unwrap_err(),
            CdnError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn directory_with_one_file_is_served() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(format!("{HASH_2}.png"));
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("128.png"), png_bytes(b"variant")).unwrap();
        let resolver = AvatarResolver::new(tmp.path());

        let asset = resolver.resolve("2").await.unwrap();
        assert_eq!(asset.bytes.as_ref(), png_bytes(b"variant").as_slice());
    }

    #[tokio::test]
    async fn empty_directory_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join(format!("{HASH_2}.png"))).unwrap();
        let resolver = AvatarResolver::new(tmp.path());

        assert!(matches!(
            resolver.resolve("2").await.unwrap_err(),
            CdnError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn bare_hash_directory_picks_first_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(HASH_2);
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("b.png"), png_bytes(b"b")).unwrap();
        std::fs::write(dir.join("a.png"), png_bytes(b"a")).unwrap();
        std::fs::create_dir(dir.join("0-subdir")).unwrap();
        let resolver = AvatarResolver::new(tmp.path());

        let asset = resolver.resolve("2").await.unwrap();
        assert_eq!(asset.bytes.as_ref(), png_bytes(b"a").as_slice());
    }

    #[tokio::test]
    async fn unrecognised_bytes_fall_back_to_octet_stream() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(format!("{HASH_2}.png")), b"plain").unwrap();
        let resolver = AvatarResolver::new(tmp.path());

        let asset = resolver.resolve("2").await.unwrap();
        assert_eq!(asset.content_type, "application/octet-stream");
    }
}
