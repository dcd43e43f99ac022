use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::error::{StoreError, StoreResult};
use crate::models::link::{Classification, Link};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagForm {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

impl TagForm {
    fn validated(&self) -> StoreResult<(String, String)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(StoreError::validation("name is required"));
        }
        let slug = match self.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.to_string(),
            None => slug::slugify(name),
        };
        Ok((name.to_string(), slug))
    }
}

impl Tag {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Tag {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM tags WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM tags WHERE slug = ?1",
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM tags ORDER BY name") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn for_content(pool: &DbPool, content_id: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT t.* FROM tags t
             JOIN content_tags ct ON ct.tag_id = t.id
             WHERE ct.content_id = ?1
             ORDER BY t.name",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![content_id], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count_items(pool: &DbPool, tag_id: i64) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row(
            "SELECT COUNT(*) FROM content_tags WHERE tag_id = ?1",
            params![tag_id],
            |row| row.get(0),
        )
        .unwrap_or(0)
    }

    pub fn create(pool: &DbPool, form: &TagForm) -> StoreResult<i64> {
        let (name, slug) = form.validated()?;
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO tags (name, slug) VALUES (?1, ?2)",
            params![name, slug],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, form: &TagForm) -> StoreResult<()> {
        let (name, slug) = form.validated()?;
        let conn = pool.get()?;
        let updated = conn.execute(
            "UPDATE tags SET name = ?1, slug = ?2, updated_at = CURRENT_TIMESTAMP WHERE id = ?3",
            params![name, slug, id],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Remove a tag and every link pointing at it.
    pub fn delete(pool: &DbPool, id: i64) -> StoreResult<()> {
        if Self::find_by_id(pool, id).is_none() {
            return Err(StoreError::NotFound);
        }
        Link::detach_all_for_classification(pool, Classification::Tag, id)?;
        let conn = pool.get()?;
        conn.execute("DELETE FROM tags WHERE id = ?1", params![id])?;
        Ok(())
    }
}
