use image::imageops::FilterType;
use std::fs;
use std::path::Path;

use crate::db::DbPool;
use crate::error::{StoreError, StoreResult};
use crate::models::settings::Setting;
use crate::validate;

/// Result of storing an uploaded file
pub struct SavedUpload {
    pub file_path: String,
    pub thumbnail_path: Option<String>,
}

fn storage_path(pool: &DbPool) -> String {
    Setting::get_or(pool, "uploads_storage_path", "data/uploads/")
}

pub fn max_upload_bytes(pool: &DbPool) -> i64 {
    let mb = Setting::get_i64(pool, "uploads_max_mb");
    let mb = if mb <= 0 { 50 } else { mb };
    mb * 1024 * 1024
}

fn unique_name(original_filename: &str) -> String {
    let ext = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|| "bin".to_string());
    format!("{}.{}", uuid::Uuid::new_v4(), ext)
}

/// Save an uploaded image and generate its thumbnail. The declared MIME
/// type must match the image allow-list as well as the extension.
pub fn store_image(
    pool: &DbPool,
    file_bytes: &[u8],
    original_filename: &str,
    declared_mime: &str,
) -> StoreResult<SavedUpload> {
    if !validate::fits_size_limit(file_bytes.len() as i64, max_upload_bytes(pool)) {
        return Err(StoreError::rejected("file is empty or too large"));
    }
    if !validate::is_allowed_mime_type(declared_mime) {
        return Err(StoreError::rejected("file type is not allowed"));
    }
    if !validate::image_upload_allowed(original_filename, declared_mime) {
        return Err(StoreError::rejected("image type is not allowed"));
    }

    let storage = storage_path(pool);
    fs::create_dir_all(&storage).map_err(|e| StoreError::Database(e.to_string()))?;

    let name = unique_name(original_filename);
    let thumb_name = format!("thumb_{}", name);
    let full = format!("{}{}", storage, name);
    let thumb_full = format!("{}{}", storage, thumb_name);

    fs::write(&full, file_bytes).map_err(|e| StoreError::Database(e.to_string()))?;

    let thumb_dim = Setting::get_or(pool, "uploads_thumb_size", "300x300");
    let (thumb_w, thumb_h) = parse_dimensions(&thumb_dim);
    let img = image::load_from_memory(file_bytes)
        .map_err(|e| StoreError::rejected(format!("not a readable image: {}", e)))?;
    let thumbnail = img.resize(thumb_w, thumb_h, FilterType::Lanczos3);
    thumbnail
        .save(&thumb_full)
        .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(SavedUpload {
        file_path: name,
        thumbnail_path: Some(thumb_name),
    })
}

/// Save an uploaded document. Documents are filtered by extension only
/// (see DESIGN.md); no thumbnail is generated.
pub fn store_document(
    pool: &DbPool,
    file_bytes: &[u8],
    original_filename: &str,
) -> StoreResult<SavedUpload> {
    if !validate::fits_size_limit(file_bytes.len() as i64, max_upload_bytes(pool)) {
        return Err(StoreError::rejected("file is empty or too large"));
    }
    if !validate::is_allowed_document_extension(original_filename) {
        return Err(StoreError::rejected("document type is not allowed"));
    }

    let storage = storage_path(pool);
    fs::create_dir_all(&storage).map_err(|e| StoreError::Database(e.to_string()))?;

    let name = unique_name(original_filename);
    let full = format!("{}{}", storage, name);
    fs::write(&full, file_bytes).map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(SavedUpload {
        file_path: name,
        thumbnail_path: None,
    })
}

/// Delete an uploaded file and its thumbnail, if any.
pub fn delete_upload(pool: &DbPool, file_path: &str) {
    let storage = storage_path(pool);
    let _ = fs::remove_file(format!("{}{}", storage, file_path));
    let _ = fs::remove_file(format!("{}thumb_{}", storage, file_path));
}

fn parse_dimensions(s: &str) -> (u32, u32) {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() == 2 {
        let w = parts[0].parse().unwrap_or(300);
        let h = parts[1].parse().unwrap_or(300);
        (w, h)
    } else {
        (300, 300)
    }
}
