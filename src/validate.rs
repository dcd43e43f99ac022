use url::Url;

/// Upload size cap in bytes (50 MiB).
pub const MAX_UPLOAD_BYTES: i64 = 50 * 1024 * 1024;

/// MIME types accepted for any upload: office documents, plain text, and
/// the four raster image formats.
const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
];

const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "webp"];

const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "xls", "xlsx", "ppt", "pptx"];

const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "youtu.be", "youtube-nocookie.com"];

pub fn is_well_formed_url(s: &str) -> bool {
    !s.trim().is_empty() && Url::parse(s.trim()).is_ok()
}

/// Parse a URL, assuming https when the scheme is missing.
fn parse_lenient(s: &str) -> Option<Url> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    match Url::parse(s) {
        Ok(u) => Some(u),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{}", s)).ok(),
        Err(_) => None,
    }
}

fn youtube_host(url: &Url) -> Option<&str> {
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    YOUTUBE_HOSTS.iter().find(|h| **h == host).copied()
}

pub fn is_youtube_url(s: &str) -> bool {
    parse_lenient(s)
        .as_ref()
        .and_then(youtube_host)
        .is_some()
}

/// Extract the video id from a YouTube URL. Supports `watch?v=ID`,
/// `youtu.be/ID`, and `embed/ID`; the first matching shape wins.
pub fn extract_youtube_id(s: &str) -> Option<String> {
    let url = parse_lenient(s)?;
    let host = youtube_host(&url)?;

    // watch?v=ID
    if url.path() == "/watch" {
        if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
            return clip_id(&v);
        }
    }

    // youtu.be/ID
    if host == "youtu.be" {
        if let Some(first) = url.path_segments().and_then(|mut seg| seg.next()) {
            return clip_id(first);
        }
    }

    // embed/ID
    if let Some(rest) = url.path().strip_prefix("/embed/") {
        return clip_id(rest);
    }

    None
}

/// The id ends at the first `&`, `?`, `#`, or newline.
fn clip_id(raw: &str) -> Option<String> {
    let end = raw.find(['&', '?', '#', '\n']).unwrap_or(raw.len());
    let id = &raw[..end];
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

pub fn thumbnail_url(video_id: &str) -> Option<String> {
    if video_id.trim().is_empty() {
        return None;
    }
    Some(format!(
        "https://img.youtube.com/vi/{}/hqdefault.jpg",
        video_id
    ))
}

pub fn is_allowed_mime_type(mime: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime.trim().to_lowercase().as_str())
}

pub fn is_valid_file_size(bytes: i64) -> bool {
    fits_size_limit(bytes, MAX_UPLOAD_BYTES)
}

pub fn fits_size_limit(bytes: i64, max_bytes: i64) -> bool {
    bytes > 0 && bytes <= max_bytes
}

fn extension_of(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

pub fn is_allowed_image_extension(filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

pub fn is_allowed_document_extension(filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| DOCUMENT_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Images must pass both the extension filter and the declared MIME type.
/// Documents are filtered by extension only (see DESIGN.md).
pub fn image_upload_allowed(filename: &str, mime: &str) -> bool {
    is_allowed_image_extension(filename) && IMAGE_MIME_TYPES.contains(&mime.trim().to_lowercase().as_str())
}
