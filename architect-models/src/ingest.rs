//! Turning files on disk into attachments.

use std::path::Path;

use mime_guess::mime;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::Attachment;

/// Image formats the normalizer can decode.
const IMAGE_SUBTYPES: &[&str] = &["png", "jpeg", "webp", "gif", "bmp"];

/// Non-`text/*` MIME subtypes that are still plain text.
const TEXT_SUBTYPES: &[&str] = &[
    "json",
    "toml",
    "xml",
    "yaml",
    "x-yaml",
    "javascript",
    "x-sh",
    "sql",
    "x-python",
];

/// Source extensions whose guessed MIME type is misleading or missing
/// (`.ts` guesses as MPEG transport stream).
const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "py", "go", "ts", "tsx", "jsx", "java", "kt", "swift", "rb", "c", "h", "cc", "cpp",
    "hpp", "cs", "php", "scala", "lua", "sh", "bash", "zsh", "sql", "tf", "proto", "graphql",
    "yml", "yaml", "toml", "ini", "cfg", "conf", "env", "md", "rst", "log", "dockerfile",
];

impl Attachment {
    /// Read a file and classify it as an image or a text block.
    ///
    /// Text blocks carry a `--- <file name> ---` header line so the model
    /// can tell multiple files apart.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFile`] for binary formats such as PDF or
    /// Office documents, and [`Error::Io`] if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        Self::from_bytes(path, bytes)
    }

    /// Classify already-loaded file contents, using `path` for naming and
    /// type detection.
    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        let guess = mime_guess::from_path(path).first_or_octet_stream();

        let is_source = extension
            .as_deref()
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
            || name.eq_ignore_ascii_case("dockerfile")
            || name.eq_ignore_ascii_case("makefile");

        if !is_source && guess.type_() == mime::IMAGE {
            if IMAGE_SUBTYPES.contains(&guess.subtype().as_str()) {
                debug!(file = %name, mime = %guess, bytes = bytes.len(), "ingested image");
                return Ok(Attachment::image(bytes, guess.essence_str()));
            }
            return Err(unsupported(path, guess.essence_str()));
        }

        let texty = is_source
            || guess.type_() == mime::TEXT
            || TEXT_SUBTYPES.contains(&guess.subtype().as_str())
            || (guess == mime::APPLICATION_OCTET_STREAM
                && extension.is_none()
                && looks_like_text(&bytes));
        if !texty {
            return Err(unsupported(path, guess.essence_str()));
        }

        let content = String::from_utf8_lossy(&bytes);
        debug!(file = %name, bytes = bytes.len(), "ingested text file");
        Ok(Attachment::text(format!("--- {name} ---\n{content}")))
    }
}

fn looks_like_text(bytes: &[u8]) -> bool {
    !bytes.contains(&0) && std::str::from_utf8(bytes).is_ok()
}

fn unsupported(path: &Path, mime: &str) -> Error {
    Error::UnsupportedFile {
        path: path.display().to_string(),
        mime: mime.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use tempfile::TempDir;

    async fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        tokio::fs::write(&path, bytes).await.unwrap();
        path
    }

    #[tokio::test]
    async fn source_file_becomes_labelled_text_block() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "main.rs", b"fn main() {}\n").await;

        let attachment = Attachment::from_path(&path).await.unwrap();
        assert_eq!(attachment, Attachment::text("--- main.rs ---\nfn main() {}\n"));
    }

    #[tokio::test]
    async fn typescript_is_text_not_video() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.ts", b"export const x = 1;").await;
        assert!(!Attachment::from_path(&path).await.unwrap().is_image());
    }

    #[tokio::test]
    async fn csv_and_json_are_text() {
        let dir = TempDir::new().unwrap();
        for name in ["data.csv", "package.json", "notes.md"] {
            let path = write(&dir, name, b"a,b\n1,2\n").await;
            let attachment = Attachment::from_path(&path).await.unwrap();
            match attachment {
                Attachment::TextBlock(text) => assert!(text.starts_with(&format!("--- {name} ---"))),
                other => panic!("{name}: expected text, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn png_becomes_image() {
        let dir = TempDir::new().unwrap();
        let mut png = Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(1, 1)
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let path = write(&dir, "Diagram.PNG", png.get_ref()).await;

        match Attachment::from_path(&path).await.unwrap() {
            Attachment::Image { mime_type, data } => {
                assert_eq!(mime_type, "image/png");
                assert_eq!(data, png.into_inner());
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn pdf_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "design.pdf", b"%PDF-1.7").await;

        let err = Attachment::from_path(&path).await.unwrap_err();
        match err {
            Error::UnsupportedFile { mime, .. } => assert_eq!(mime, "application/pdf"),
            other => panic!("expected UnsupportedFile, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn extensionless_text_is_accepted_and_binary_is_not() {
        let dir = TempDir::new().unwrap();
        let text = write(&dir, "LICENSE", b"MIT License").await;
        assert!(Attachment::from_path(&text).await.is_ok());

        let binary = write(&dir, "blob", &[0x7f, b'E', b'L', b'F', 0, 0]).await;
        assert!(matches!(
            Attachment::from_path(&binary).await,
            Err(Error::UnsupportedFile { .. })
        ));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = Attachment::from_path("/nonexistent/architect/file.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
