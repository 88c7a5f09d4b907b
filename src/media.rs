//! Storage of uploaded images under the media root

use std::io::ErrorKind;
use std::path::Path;

use rand::{distr::Alphanumeric, Rng};
use tokio::io::AsyncWriteExt;

use crate::error::Result;

/// Subdirectory of the media root that ad images go to
pub const IMAGE_DIR: &str = "images";

/// Writes `data` under `<media_root>/images/` and returns the stored path
/// relative to the media root
///
/// The client-supplied name is reduced to its final path component. If a
/// file with that name already exists, a random 7-character suffix is
/// appended to the stem until the name is free.
pub async fn save_image(media_root: &Path, file_name: &str, data: &[u8]) -> Result<String> {
    let dir = media_root.join(IMAGE_DIR);
    tokio::fs::create_dir_all(&dir).await?;

    let (stem, extension) = split_name(file_name);
    let mut candidate = join_name(&stem, extension.as_deref());

    loop {
        let open = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&candidate))
            .await;

        match open {
            Ok(mut file) => {
                file.write_all(data).await?;
                file.flush().await?;
                tracing::debug!(file = %candidate, bytes = data.len(), "image stored");
                return Ok(format!("{IMAGE_DIR}/{candidate}"));
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                let suffix: String = rand::rng()
                    .sample_iter(&Alphanumeric)
                    .take(7)
                    .map(char::from)
                    .collect();
                candidate = join_name(&format!("{stem}_{suffix}"), extension.as_deref());
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn split_name(file_name: &str) -> (String, Option<String>) {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("upload");
    let base = Path::new(base);

    let stem = base
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("upload")
        .to_string();
    let extension = base
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_string);

    (stem, extension)
}

fn join_name(stem: &str, extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem.to_string(),
    }
}
