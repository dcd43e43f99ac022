use rusqlite::params;

use crate::db::DbPool;
use crate::error::{StoreError, StoreResult};

/// Which classification side a link joins content to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Category,
    Tag,
}

impl Classification {
    fn join_table(&self) -> &'static str {
        match self {
            Classification::Category => "content_categories",
            Classification::Tag => "content_tags",
        }
    }

    fn fk_column(&self) -> &'static str {
        match self {
            Classification::Category => "category_id",
            Classification::Tag => "tag_id",
        }
    }

    fn parent_table(&self) -> &'static str {
        match self {
            Classification::Category => "categories",
            Classification::Tag => "tags",
        }
    }

    pub fn from_route(s: &str) -> Option<Self> {
        match s {
            "categories" => Some(Classification::Category),
            "tags" => Some(Classification::Tag),
            _ => None,
        }
    }
}

impl<'a> rocket::request::FromParam<'a> for Classification {
    type Error = &'a str;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        Classification::from_route(param).ok_or(param)
    }
}

/// Many-to-many links between content and categories/tags.
///
/// Attach is idempotent: re-attaching an existing pair is a no-op success,
/// and the unique composite key makes a racing duplicate insert collapse to
/// one row. Detach is strict: removing a link that is not there is NotFound.
pub struct Link;

impl Link {
    pub fn attach(
        pool: &DbPool,
        content_id: i64,
        class: Classification,
        class_id: i64,
    ) -> StoreResult<()> {
        let conn = pool.get()?;

        let content_exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM content WHERE id = ?1",
            params![content_id],
            |row| row.get(0),
        )?;
        if content_exists == 0 {
            return Err(StoreError::NotFound);
        }
        let class_exists: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE id = ?1", class.parent_table()),
            params![class_id],
            |row| row.get(0),
        )?;
        if class_exists == 0 {
            return Err(StoreError::NotFound);
        }

        conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (content_id, {}) VALUES (?1, ?2)",
                class.join_table(),
                class.fk_column()
            ),
            params![content_id, class_id],
        )?;
        Ok(())
    }

    pub fn detach(
        pool: &DbPool,
        content_id: i64,
        class: Classification,
        class_id: i64,
    ) -> StoreResult<()> {
        let conn = pool.get()?;
        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE content_id = ?1 AND {} = ?2",
                class.join_table(),
                class.fk_column()
            ),
            params![content_id, class_id],
        )?;
        if removed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub fn exists(pool: &DbPool, content_id: i64, class: Classification, class_id: i64) -> bool {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return false,
        };
        conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE content_id = ?1 AND {} = ?2",
                class.join_table(),
                class.fk_column()
            ),
            params![content_id, class_id],
            |row| row.get::<_, i64>(0),
        )
        .map(|c| c > 0)
        .unwrap_or(false)
    }

    pub fn detach_all_for_content(pool: &DbPool, content_id: i64) -> StoreResult<()> {
        let conn = pool.get()?;
        conn.execute(
            "DELETE FROM content_categories WHERE content_id = ?1",
            params![content_id],
        )?;
        conn.execute(
            "DELETE FROM content_tags WHERE content_id = ?1",
            params![content_id],
        )?;
        Ok(())
    }

    pub fn detach_all_for_classification(
        pool: &DbPool,
        class: Classification,
        class_id: i64,
    ) -> StoreResult<()> {
        let conn = pool.get()?;
        conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1",
                class.join_table(),
                class.fk_column()
            ),
            params![class_id],
        )?;
        Ok(())
    }
}
