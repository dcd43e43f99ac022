use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::error::{StoreError, StoreResult};
use crate::validate;

/// The four classifiable content kinds. All CRUD and association logic is
/// implemented once over this enum; each kind only supplies its own field
/// requirements in `ContentForm::validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    Course,
    VideoCourse,
    Document,
    Event,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Course,
        ContentKind::VideoCourse,
        ContentKind::Document,
        ContentKind::Event,
    ];

    /// Canonical string stored in the `content.kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Course => "course",
            ContentKind::VideoCourse => "videoCourse",
            ContentKind::Document => "document",
            ContentKind::Event => "event",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        ContentKind::ALL.iter().copied().find(|k| k.as_str() == s)
    }

    /// Plural route segment, e.g. `/api/videoCourses`.
    pub fn route_str(&self) -> &'static str {
        match self {
            ContentKind::Course => "courses",
            ContentKind::VideoCourse => "videoCourses",
            ContentKind::Document => "documents",
            ContentKind::Event => "events",
        }
    }

    pub fn from_route(s: &str) -> Option<Self> {
        match s {
            "courses" => Some(ContentKind::Course),
            "videoCourses" => Some(ContentKind::VideoCourse),
            "documents" => Some(ContentKind::Document),
            "events" => Some(ContentKind::Event),
            _ => None,
        }
    }
}

impl<'a> rocket::request::FromParam<'a> for ContentKind {
    type Error = &'a str;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        ContentKind::from_route(param).ok_or(param)
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ContentItem {
    pub id: i64,
    pub kind: ContentKind,
    pub title: String,
    pub description: Option<String>,
    pub resource_url: Option<String>,
    pub video_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub file_path: Option<String>,
    pub starts_at: Option<NaiveDateTime>,
    pub ends_at: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub clicks: i64,
    pub created_by: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Inbound create/update payload. Unknown fields are rejected outright;
/// `clicks` is deliberately absent so a general update can never touch the
/// counter.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ContentForm {
    pub title: String,
    pub description: Option<String>,
    pub resource_url: Option<String>,
    pub file_path: Option<String>,
    pub starts_at: Option<NaiveDateTime>,
    pub ends_at: Option<NaiveDateTime>,
    pub location: Option<String>,
}

impl ContentForm {
    /// Enforce per-kind required fields and derive video metadata.
    /// Returns (video_id, thumbnail_url) for video courses.
    pub fn validate(&self, kind: ContentKind) -> StoreResult<(Option<String>, Option<String>)> {
        if self.title.trim().is_empty() {
            return Err(StoreError::validation("title is required"));
        }

        match kind {
            ContentKind::Course => {
                if let Some(url) = non_empty(&self.resource_url) {
                    if !validate::is_well_formed_url(url) {
                        return Err(StoreError::validation("resource_url is not a valid URL"));
                    }
                }
                Ok((None, None))
            }
            ContentKind::VideoCourse => {
                let url = non_empty(&self.resource_url)
                    .ok_or_else(|| StoreError::validation("video courses require a video URL"))?;
                if !validate::is_youtube_url(url) {
                    return Err(StoreError::validation(
                        "resource_url must be a YouTube video URL",
                    ));
                }
                let video_id = validate::extract_youtube_id(url).ok_or_else(|| {
                    StoreError::validation("could not extract a video id from resource_url")
                })?;
                let thumb = validate::thumbnail_url(&video_id);
                Ok((Some(video_id), thumb))
            }
            ContentKind::Document => {
                let path = non_empty(&self.file_path)
                    .ok_or_else(|| StoreError::validation("documents require an uploaded file"))?;
                if !validate::is_allowed_document_extension(path) {
                    return Err(StoreError::validation("file type is not allowed"));
                }
                Ok((None, None))
            }
            ContentKind::Event => {
                let starts = self
                    .starts_at
                    .ok_or_else(|| StoreError::validation("events require a start time"))?;
                if let Some(ends) = self.ends_at {
                    if ends < starts {
                        return Err(StoreError::validation("ends_at is before starts_at"));
                    }
                }
                Ok((None, None))
            }
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ContentItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let kind_str: String = row.get("kind")?;
        let kind = ContentKind::from_db(&kind_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("unknown content kind '{}'", kind_str).into(),
            )
        })?;
        Ok(ContentItem {
            id: row.get("id")?,
            kind,
            title: row.get("title")?,
            description: row.get("description")?,
            resource_url: row.get("resource_url")?,
            video_id: row.get("video_id")?,
            thumbnail_url: row.get("thumbnail_url")?,
            file_path: row.get("file_path")?,
            starts_at: row.get("starts_at")?,
            ends_at: row.get("ends_at")?,
            location: row.get("location")?,
            clicks: row.get("clicks")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, kind: ContentKind, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM content WHERE id = ?1 AND kind = ?2",
            params![id, kind.as_str()],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool, kind: ContentKind, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM content WHERE kind = ?1 ORDER BY created_at DESC, id DESC
             LIMIT ?2 OFFSET ?3",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![kind.as_str(), limit, offset], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool, kind: ContentKind) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row(
            "SELECT COUNT(*) FROM content WHERE kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )
        .unwrap_or(0)
    }

    pub fn by_category(
        pool: &DbPool,
        kind: ContentKind,
        category_id: i64,
        limit: i64,
        offset: i64,
    ) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT c.* FROM content c
             JOIN content_categories cc ON cc.content_id = c.id
             WHERE c.kind = ?1 AND cc.category_id = ?2
             ORDER BY c.created_at DESC, c.id DESC LIMIT ?3 OFFSET ?4",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(
            params![kind.as_str(), category_id, limit, offset],
            Self::from_row,
        )
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }

    pub fn by_tag(pool: &DbPool, kind: ContentKind, tag_id: i64, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT c.* FROM content c
             JOIN content_tags ct ON ct.content_id = c.id
             WHERE c.kind = ?1 AND ct.tag_id = ?2
             ORDER BY c.created_at DESC, c.id DESC LIMIT ?3 OFFSET ?4",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![kind.as_str(), tag_id, limit, offset], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(
        pool: &DbPool,
        kind: ContentKind,
        form: &ContentForm,
        admin_id: i64,
    ) -> StoreResult<i64> {
        let (video_id, thumbnail_url) = form.validate(kind)?;
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO content
             (kind, title, description, resource_url, video_id, thumbnail_url, file_path,
              starts_at, ends_at, location, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                kind.as_str(),
                form.title.trim(),
                form.description,
                non_empty(&form.resource_url),
                video_id,
                thumbnail_url,
                non_empty(&form.file_path),
                form.starts_at,
                form.ends_at,
                form.location,
                admin_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, kind: ContentKind, id: i64, form: &ContentForm) -> StoreResult<()> {
        let (video_id, thumbnail_url) = form.validate(kind)?;
        let conn = pool.get()?;
        let updated = conn.execute(
            "UPDATE content SET
               title = ?1, description = ?2, resource_url = ?3, video_id = ?4,
               thumbnail_url = ?5, file_path = ?6, starts_at = ?7, ends_at = ?8,
               location = ?9, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?10 AND kind = ?11",
            params![
                form.title.trim(),
                form.description,
                non_empty(&form.resource_url),
                video_id,
                thumbnail_url,
                non_empty(&form.file_path),
                form.starts_at,
                form.ends_at,
                form.location,
                id,
                kind.as_str(),
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Delete an item. Association rows go first so no link ever references
    /// a missing content row.
    pub fn delete(pool: &DbPool, kind: ContentKind, id: i64) -> StoreResult<()> {
        if Self::find_by_id(pool, kind, id).is_none() {
            return Err(StoreError::NotFound);
        }
        crate::models::link::Link::detach_all_for_content(pool, id)?;
        let conn = pool.get()?;
        conn.execute(
            "DELETE FROM content WHERE id = ?1 AND kind = ?2",
            params![id, kind.as_str()],
        )?;
        Ok(())
    }

    /// The only write path for the click counter. Returns the new value.
    pub fn increment_clicks(pool: &DbPool, kind: ContentKind, id: i64) -> StoreResult<i64> {
        let conn = pool.get()?;
        let updated = conn.execute(
            "UPDATE content SET clicks = clicks + 1 WHERE id = ?1 AND kind = ?2",
            params![id, kind.as_str()],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        let clicks = conn.query_row(
            "SELECT clicks FROM content WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(clicks)
    }

    /// Nullify ownership when an admin account is removed; their content stays.
    pub fn orphan_by_admin(pool: &DbPool, admin_id: i64) -> StoreResult<()> {
        let conn = pool.get()?;
        conn.execute(
            "UPDATE content SET created_by = NULL WHERE created_by = ?1",
            params![admin_id],
        )?;
        Ok(())
    }
}
