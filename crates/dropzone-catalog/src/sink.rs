//! Filesystem sink for downloaded payloads.

use std::error::Error;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dropzone_core::{DownloadPayload, FileSink, SavedFile, model::FALLBACK_FILENAME};
use tokio::fs::OpenOptions;
use uuid::Uuid;

const MAX_NAME_CHARS: usize = 200;
const MAX_EXTENSION_CHARS: usize = 8;

/// Saves payloads into a directory.
///
/// Bytes are staged in a uniquely named hidden `.part` file. The final name is
/// claimed with an exclusive create, then the staged file is renamed over the
/// claim. Existing files are never overwritten; a ` (n)` suffix is added
/// instead, so concurrent saves of one name each land in their own file.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Sink writing into `root`, created on first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Target directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl FileSink for DirectorySink {
    async fn save(
        &self,
        suggested_name: &str,
        payload: &DownloadPayload,
    ) -> Result<SavedFile, Box<dyn Error + Send + Sync>> {
        tokio::fs::create_dir_all(&self.root).await?;
        let name = sanitize_filename(suggested_name);
        let staging =
            RemoveOnDrop::new(self.root.join(format!(".{name}.{}.part", Uuid::new_v4())));
        tokio::fs::write(staging.path(), &payload.body).await?;

        let claim = RemoveOnDrop::new(claim_path(&self.root, &name).await?);
        tokio::fs::rename(staging.path(), claim.path()).await?;
        staging.disarm();
        let target = claim.disarm();

        tracing::debug!(path = %target.display(), bytes = payload.len(), "payload written");
        Ok(SavedFile {
            path: target,
            bytes: payload.len(),
        })
    }
}

/// Removes a staged file or an unfilled claim unless disarmed.
struct RemoveOnDrop {
    path: PathBuf,
    armed: bool,
}

impl RemoveOnDrop {
    const fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn disarm(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        if self.armed {
            if let Err(err) = std::fs::remove_file(&self.path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %err, "failed to remove partial download");
                }
            }
        }
    }
}

/// Replace path separators, reserved characters, and control characters.
#[must_use]
pub fn sanitize_filename(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .take(MAX_NAME_CHARS)
        .collect();
    let trimmed = cleaned.trim_matches(|ch: char| ch.is_whitespace() || ch == '.');
    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Split a short alphanumeric extension off a filename.
pub(crate) fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, extension))
            if !stem.is_empty()
                && !extension.is_empty()
                && extension.len() <= MAX_EXTENSION_CHARS
                && extension.chars().all(|ch| ch.is_ascii_alphanumeric()) =>
        {
            (stem, Some(extension))
        }
        _ => (name, None),
    }
}

/// Reserve the first free `name`, `stem (1).ext`, ... by creating it exclusively.
async fn claim_path(root: &Path, name: &str) -> std::io::Result<PathBuf> {
    let (stem, extension) = split_extension(name);
    let mut counter = 0_u32;
    loop {
        let candidate = match (counter, extension) {
            (0, _) => root.join(name),
            (_, Some(extension)) => root.join(format!("{stem} ({counter}).{extension}")),
            (_, None) => root.join(format!("{stem} ({counter})")),
        };
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(_) => return Ok(candidate),
            Err(err) if err.kind() == ErrorKind::AlreadyExists && counter < u32::MAX => {
                counter += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn payload(body: &[u8]) -> DownloadPayload {
        DownloadPayload {
            body: body.to_vec(),
            content_type: None,
            filename: None,
        }
    }

    #[test]
    fn sanitize_strips_separators_and_dots() {
        assert_eq!(sanitize_filename("../etc/passwd"), "_etc_passwd");
        assert_eq!(sanitize_filename("a:b*c"), "a_b_c");
        assert_eq!(sanitize_filename(" .. "), FALLBACK_FILENAME);
    }

    #[test]
    fn extension_split_ignores_prose_dots() {
        assert_eq!(split_extension("notes.pdf"), ("notes", Some("pdf")));
        assert_eq!(split_extension("Rust 2.0 Guide"), ("Rust 2.0 Guide", None));
        assert_eq!(split_extension(".hidden"), (".hidden", None));
    }

    #[tokio::test]
    async fn saves_and_numbers_collisions() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let sink = DirectorySink::new(dir.path());

        let first = sink
            .save("Guide.pdf", &payload(b"one"))
            .await
            .map_err(|err| anyhow::anyhow!(err))?;
        let second = sink
            .save("Guide.pdf", &payload(b"two"))
            .await
            .map_err(|err| anyhow::anyhow!(err))?;

        assert_eq!(first.path, dir.path().join("Guide.pdf"));
        assert_eq!(second.path, dir.path().join("Guide (1).pdf"));
        assert_eq!(std::fs::read(&second.path)?, b"two");
        assert_eq!(second.bytes, 3);
        assert_eq!(entries(dir.path())?, ["Guide (1).pdf", "Guide.pdf"]);
        Ok(())
    }

    #[tokio::test]
    async fn failed_write_leaves_no_partial_file() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"not a directory")?;
        let sink = DirectorySink::new(&blocker);

        let result = sink.save("Guide.pdf", &payload(b"one")).await;
        assert!(result.is_err());
        assert_eq!(entries(dir.path())?, ["blocked"]);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_of_one_name_keep_every_file() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let sink = DirectorySink::new(dir.path());

        let tasks: Vec<_> = (0..8_u8)
            .map(|index| {
                let sink = sink.clone();
                tokio::spawn(async move {
                    let body = format!("copy {index}").into_bytes();
                    let saved = sink.save("Guide.pdf", &payload(&body)).await;
                    saved.map(|saved| (saved, body)).map_err(|err| anyhow::anyhow!(err))
                })
            })
            .collect();

        let mut paths = Vec::new();
        for task in tasks {
            let (saved, body) = task.await??;
            assert_eq!(std::fs::read(&saved.path)?, body);
            paths.push(saved.path);
        }
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 8);

        let names = entries(dir.path())?;
        assert_eq!(names.len(), 8);
        assert!(names.iter().all(|name| !name.starts_with('.')));
        assert!(names.contains(&"Guide.pdf".to_string()));
        assert!(names.contains(&"Guide (7).pdf".to_string()));
        Ok(())
    }

    fn entries(dir: &Path) -> anyhow::Result<Vec<String>> {
        let mut names = std::fs::read_dir(dir)?
            .map(|entry| Ok(entry?.file_name().to_string_lossy().into_owned()))
            .collect::<anyhow::Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }
}
