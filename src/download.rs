use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use image::ImageReader;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::llm::media::extension_for_mime;
use crate::llm::GeneratedImage;

const FILE_PREFIX: &str = "theme_canvas";

pub fn image_file_name(mime_type: &str, timestamp: DateTime<Local>) -> String {
    format!(
        "{}_{}.{}",
        FILE_PREFIX,
        timestamp.format("%Y%m%d_%H%M%S"),
        extension_for_mime(mime_type)
    )
}

fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

fn candidate_path(dir: &Path, file_name: &str, counter: u32) -> PathBuf {
    if counter == 0 {
        return dir.join(file_name);
    }
    let (stem, extension) = file_name.rsplit_once('.').unwrap_or((file_name, "png"));
    dir.join(format!("{stem}_{counter}.{extension}"))
}

/// Creates a file that did not exist before, adding `_1`, `_2`, ... to the
/// stem until the name is free, and writes `bytes` into it.
async fn write_new_file(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let mut counter = 0;
    loop {
        let path = candidate_path(dir, file_name, counter);
        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(mut file) => {
                file.write_all(bytes)
                    .await
                    .map_err(|err| anyhow!("Failed to write image '{}': {}", path.display(), err))?;
                file.flush()
                    .await
                    .map_err(|err| anyhow!("Failed to write image '{}': {}", path.display(), err))?;
                return Ok(path);
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => counter += 1,
            Err(err) => {
                return Err(anyhow!("Failed to create image '{}': {}", path.display(), err));
            }
        }
    }
}

/// Writes the image under `dir` and returns the path written.
pub async fn save_image(image: &GeneratedImage, dir: &Path) -> Result<PathBuf> {
    if image.bytes.is_empty() {
        return Err(anyhow!("Refusing to save an empty image"));
    }

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|err| anyhow!("Failed to create output directory '{}': {}", dir.display(), err))?;

    let file_name = image_file_name(&image.mime_type, Local::now());
    let path = write_new_file(dir, &file_name, &image.bytes).await?;

    match image_dimensions(&image.bytes) {
        Some((width, height)) => info!(
            "Saved {}x{} image ({} bytes) to {}",
            width,
            height,
            image.bytes.len(),
            path.display()
        ),
        None => warn!(
            "Saved image to {} but its dimensions could not be read ({})",
            path.display(),
            image.mime_type
        ),
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn temp_output_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "theme_canvas_{}_{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn tiny_png() -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbImage::new(3, 2)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn file_name_uses_timestamp_and_extension() {
        let timestamp = Local.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(
            image_file_name("image/jpeg", timestamp),
            "theme_canvas_20260301_090507.jpg"
        );
        assert_eq!(
            image_file_name("image/png", timestamp),
            "theme_canvas_20260301_090507.png"
        );
    }

    #[test]
    fn reads_dimensions_of_real_images_only() {
        assert_eq!(image_dimensions(&tiny_png()), Some((3, 2)));
        assert_eq!(image_dimensions(b"nope"), None);
    }

    #[tokio::test]
    async fn saves_without_overwriting() {
        let dir = temp_output_dir("save");
        let image = GeneratedImage::new(tiny_png(), None);

        let first = save_image(&image, &dir).await.unwrap();
        let second = save_image(&image, &dir).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(first.extension().unwrap(), "png");
        assert_eq!(std::fs::read(&first).unwrap(), image.bytes);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn existing_files_are_never_overwritten() {
        let dir = temp_output_dir("collide");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("shot.png"), b"first").unwrap();
        std::fs::write(dir.join("shot_1.png"), b"second").unwrap();

        let path = write_new_file(&dir, "shot.png", b"third").await.unwrap();
        assert_eq!(path, dir.join("shot_2.png"));
        assert_eq!(std::fs::read(dir.join("shot.png")).unwrap(), b"first");
        assert_eq!(std::fs::read(dir.join("shot_1.png")).unwrap(), b"second");
        assert_eq!(std::fs::read(&path).unwrap(), b"third");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn empty_image_is_rejected() {
        let dir = temp_output_dir("empty");
        let image = GeneratedImage {
            bytes: Vec::new(),
            mime_type: "image/png".to_string(),
            revised_prompt: None,
        };
        assert!(save_image(&image, &dir).await.is_err());
        assert!(!dir.exists());
    }
}
