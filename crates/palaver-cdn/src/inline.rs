use std::path::{Component, Path, PathBuf};

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use crate::CdnError;

/// Standard alphabet; trailing `=` padding optional.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Writes inline `data:image/...;base64,...` payloads under a public root.
#[derive(Debug, Clone)]
pub struct InlineStore {
    base_dir: PathBuf,
}

/// The parts of a data URL that matter here.
#[derive(Debug, PartialEq, Eq)]
struct ImageDataUrl<'a> {
    extension: &'a str,
    content: &'a str,
}

/// Accepts exactly `data:image/<letters>;base64,<content>`.
fn parse_image_data_url(body: &str) -> Option<ImageDataUrl<'_>> {
    let rest = body.strip_prefix("data:")?;
    let (header, content) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let extension = mime.strip_prefix("image/")?;
    if extension.is_empty() || !extension.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    Some(ImageDataUrl { extension, content })
}

/// Line breaks and other ASCII whitespace inside the content are ignored.
fn decode_base64(content: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    LENIENT_BASE64.decode(compact)
}

fn is_safe_relative(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

impl InlineStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Decode and store an optional inline image.
    ///
    /// `None` (or an empty body) means no file was supplied and yields
    /// `Ok(None)`. Otherwise the image is written to
    /// `<base_dir>/<save_path>.<ext>` and `<save_path>.<ext>` is returned.
    /// Malformed payloads and write failures both surface as
    /// `CdnError::InvalidPayload`.
    pub async fn handle(
        &self,
        save_path: &str,
        body: Option<&str>,
    ) -> Result<Option<String>, CdnError> {
        let body = match body {
            Some(b) if !b.is_empty() => b,
            _ => return Ok(None),
        };

        match self.write(save_path, body).await {
            Ok(stored) => Ok(Some(stored)),
            Err(reason) => {
                tracing::error!(save_path, "inline payload rejected: {reason}");
                Err(CdnError::InvalidPayload(save_path.to_string()))
            }
        }
    }

    async fn write(&self, save_path: &str, body: &str) -> Result<String, String> {
        if !is_safe_relative(save_path) {
            return Err("save path must be relative".into());
        }
        let url = parse_image_data_url(body).ok_or("not an image data url")?;
        let bytes = decode_base64(url.content).map_err(|e| format!("base64: {e}"))?;

        let relative = format!("{save_path}.{}", url.extension);
        let path = self.base_dir.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("mkdir: {e}"))?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| format!("write {}: {e}", path.display()))?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "stored inline payload");
        Ok(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_image_data_urls() {
        assert_eq!(
            parse_image_data_url("data:image/png;base64,QQ=="),
            Some(ImageDataUrl {
                extension: "png",
                content: "QQ=="
            })
        );
        assert_eq!(
            parse_image_data_url("data:image/jpeg;base64,").map(|u| u.extension),
            Some("jpeg")
        );
    }

    #[test]
    fn parse_rejects_other_shapes() {
        for body in [
            "image/png;base64,QQ==",
            "data:text/plain;base64,QQ==",
            "data:image/png,QQ==",
            "data:image/svg+xml;base64,QQ==",
            "data:image/;base64,QQ==",
            "data:image/png;base64",
        ] {
            assert!(parse_image_data_url(body).is_none(), "{body}");
        }
    }

    #[test]
    fn relative_path_check() {
        assert!(is_safe_relative("avatars/42"));
        assert!(is_safe_relative("./avatars/42"));
        assert!(!is_safe_relative("../etc/passwd"));
        assert!(!is_safe_relative("avatars/../../x"));
        assert!(!is_safe_relative("/abs/path"));
        assert!(!is_safe_relative(""));
    }

    #[tokio::test]
    async fn stores_decoded_bytes_with_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let store = InlineStore::new(tmp.path());

        let stored = store
            .handle("avatars/42", Some("data:image/png;base64,QQ=="))
            .await
            .unwrap();
        assert_eq!(stored.as_deref(), Some("avatars/42.png"));

        let on_disk = std::fs::read(tmp.path().join("avatars/42.png")).unwrap();
        assert_eq!(on_disk, b"A");
    }

    #[tokio::test]
    async fn unpadded_content_is_accepted() {
        let tmp = tempfile::tempdir().unwrap();
        let store = InlineStore::new(tmp.path());

        let stored = store
            .handle("avatars/42", Some("data:image/png;base64,QQ"))
            .await
            .unwrap();
        assert_eq!(stored.as_deref(), Some("avatars/42.png"));
        assert_eq!(std::fs::read(tmp.path().join("avatars/42.png")).unwrap(), b"A");
    }

    #[tokio::test]
    async fn line_wrapped_content_is_accepted() {
        let tmp = tempfile::tempdir().unwrap();
        let store = InlineStore::new(tmp.path());

        store
            .handle("icons/7", Some("data:image/gif;base64,QUFB\nQUFB\r\n"))
            .await
            .unwrap();
        assert_eq!(std::fs::read(tmp.path().join("icons/7.gif")).unwrap(), b"AAAAAA");
    }

    #[tokio::test]
    async fn comma_inside_content_is_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        let store = InlineStore::new(tmp.path());

        let err = store
            .handle("avatars/42", Some("data:image/png;base64,QQ==,Qg=="))
            .await
            .unwrap_err();
        assert!(matches!(err, CdnError::InvalidPayload(_)));
        assert!(!tmp.path().join("avatars/42.png").exists());
    }

    #[tokio::test]
    async fn missing_payload_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = InlineStore::new(tmp.path());

        assert_eq!(store.handle("avatars/42", None).await.unwrap(), None);
        assert_eq!(store.handle("avatars/42", Some("")).await.unwrap(), None);
        assert!(!tmp.path().join("avatars").exists());
    }

    #[tokio::test]
    async fn malformed_payloads_are_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        let store = InlineStore::new(tmp.path());

        for body in [
            "QQ==",
            "data:text/plain;base64,QQ==",
            "data:image/png;base64,not base64!",
        ] {
            let err = store.handle("avatars/42", Some(body)).await.unwrap_err();
            match err {
                CdnError::InvalidPayload(p) => assert_eq!(p, "avatars/42"),
                other => panic!("unexpected error for {body}: {other}"),
            }
        }
    }

    #[tokio::test]
    async fn write_failure_is_reported_as_invalid_payload() {
        let tmp = tempfile::tempdir().unwrap();
        // A regular file where a directory is needed makes mkdir fail.
        std::fs::write(tmp.path().join("avatars"), b"blocker").unwrap();
        let store = InlineStore::new(tmp.path());

        let err = store
            .handle("avatars/42", Some("data:image/png;base64,QQ=="))
            .await
            .unwrap_err();
        assert!(matches!(err, CdnError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn escaping_save_path_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = InlineStore::new(tmp.path().join("public"));

        let err = store
            .handle("../outside", Some("data:image/png;base64,QQ=="))
            .await
            .unwrap_err();
        assert!(matches!(err, CdnError::InvalidPayload(_)));
        assert!(!tmp.path().join("outside.png").exists());
    }

    #[tokio::test]
    async fn rewriting_same_path_last_writer_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let store = InlineStore::new(tmp.path());

        store
            .handle("icons/1", Some("data:image/png;base64,QQ=="))
            .await
            .unwrap();
        store
            .handle("icons/1", Some("data:image/png;base64,Qg=="))
            .await
            .unwrap();
        assert_eq!(std::fs::read(tmp.path().join("icons/1.png")).unwrap(), b"B");
    }
}
