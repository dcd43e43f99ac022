use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::error::StoreResult;
use crate::models::content::ContentItem;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Admin {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Admin {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Admin {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            last_login_at: row.get("last_login_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn get_by_id(pool: &DbPool, id: i64) -> Option<Admin> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM admins WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn get_by_email(pool: &DbPool, email: &str) -> Option<Admin> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM admins WHERE email = ?1",
            params![email],
            Self::from_row,
        )
        .ok()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn create(pool: &DbPool, name: &str, email: &str, password_hash: &str) -> StoreResult<i64> {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO admins (name, email, password_hash) VALUES (?1, ?2, ?3)",
            params![name, email, password_hash],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_password(pool: &DbPool, id: i64, password_hash: &str) -> StoreResult<()> {
        let conn = pool.get()?;
        conn.execute(
            "UPDATE admins SET password_hash = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![password_hash, id],
        )?;
        Ok(())
    }

    pub fn touch_last_login(pool: &DbPool, id: i64) -> StoreResult<()> {
        let conn = pool.get()?;
        conn.execute(
            "UPDATE admins SET last_login_at = CURRENT_TIMESTAMP WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    /// Remove an account. Sessions are dropped and content ownership is
    /// nullified; the content itself stays in the catalog.
    pub fn delete(pool: &DbPool, id: i64) -> StoreResult<()> {
        {
            let conn = pool.get()?;
            conn.execute("DELETE FROM sessions WHERE admin_id = ?1", params![id])?;
        }
        ContentItem::orphan_by_admin(pool, id)?;
        let conn = pool.get()?;
        conn.execute("DELETE FROM admins WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Serializable view without the password hash.
    pub fn safe_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "last_login_at": self.last_login_at,
            "created_at": self.created_at,
        })
    }
}
