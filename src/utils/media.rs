//! Thumbnail storage under the configured media root.

use std::io;
use std::path::{Component, Path};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];
const THUMBNAIL_DIR: &str = "thumbnails";

/// Pick a file extension for an upload, or `None` when it is not an image.
///
/// The declared content type wins; the file name is consulted when the type
/// is missing or generic.
pub fn image_extension(file_name: Option<&str>, content_type: Option<&str>) -> Option<&'static str> {
    let from_name = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .and_then(|ext| IMAGE_EXTENSIONS.iter().copied().find(|&known| known == ext));

    match content_type {
        Some(ct) if ct.starts_with("image/") => from_name.or_else(|| {
            mime_guess::get_mime_extensions_str(ct)
                .into_iter()
                .flatten()
                .find_map(|ext| IMAGE_EXTENSIONS.iter().copied().find(|known| known == ext))
        }),
        Some(ct) if ct != "application/octet-stream" => None,
        _ => from_name.filter(|ext| {
            mime_guess::from_ext(ext)
                .first()
                .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE)
        }),
    }
}

/// True for a relative path that stays inside the media root.
pub fn is_safe_relative(path: &str) -> bool {
    let path = Path::new(path);
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

/// True for paths handed out by [`store_thumbnail`].
pub fn is_stored_thumbnail(relative: &str) -> bool {
    Path::new(relative).starts_with(THUMBNAIL_DIR)
}

/// Write an uploaded image and return its path relative to `root`.
pub async fn store_thumbnail(root: &Path, bytes: &[u8], extension: &str) -> io::Result<String> {
    let dir = root.join(THUMBNAIL_DIR);
    tokio::fs::create_dir_all(&dir).await?;

    let file_name = format!("{}.{extension}", uuid::Uuid::new_v4());
    tokio::fs::write(dir.join(&file_name), bytes).await?;

    Ok(format!("{THUMBNAIL_DIR}/{file_name}"))
}

/// Remove a previously stored thumbnail. Missing files are not an error.
pub async fn remove_thumbnail(root: &Path, relative: &str) -> io::Result<()> {
    if !is_safe_relative(relative) {
        return Ok(());
    }
    match tokio::fs::remove_file(root.join(relative)).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Public URL for a stored media path.
pub fn media_url(url_prefix: &str, relative: &str) -> String {
    format!("{}/{}", url_prefix.trim_end_matches('/'), relative)
}
