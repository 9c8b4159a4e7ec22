//! Upload storage for source drawings.

use std::path::PathBuf;

/// Writes uploaded files under a single directory.
///
/// Stored names are `{uuid}-{sanitized original name}`, so two uploads
/// with the same original name never collide.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write `bytes` and return the stored path, which becomes the
    /// drawing's `originalUrl`.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> std::io::Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let stored_name = format!("{}-{}", uuid::Uuid::new_v4(), sanitize_file_name(original_name));
        let path = self.dir.join(stored_name);
        tokio::fs::write(&path, bytes).await?;

        Ok(path.to_string_lossy().into_owned())
    }
}

/// Keep only the final path component and replace anything outside
/// `[A-Za-z0-9._-]` with `_`.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\plans\\floor 1.png"), "floor_1.png");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[tokio::test]
    async fn save_writes_file_under_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));

        let stored = store.save("a.jpg", b"image-bytes").await.unwrap();

        assert!(stored.ends_with("-a.jpg"));
        assert!(stored.starts_with(dir.path().join("uploads").to_str().unwrap()));
        let written = tokio::fs::read(&stored).await.unwrap();
        assert_eq!(written, b"image-bytes");
    }
}
