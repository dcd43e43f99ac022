use chrono::NaiveDateTime;
use rusqlite::params;
use serde::Serialize;

use crate::db::DbPool;

#[derive(Debug, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub admin_id: Option<i64>,
    pub admin_name: Option<String>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub entity_title: Option<String>,
    pub created_at: NaiveDateTime,
}

impl AuditEntry {
    /// Best-effort: audit failures never fail the mutation they describe.
    pub fn log(
        pool: &DbPool,
        admin_id: Option<i64>,
        admin_name: Option<&str>,
        action: &str,
        entity_type: Option<&str>,
        entity_id: Option<i64>,
        entity_title: Option<&str>,
    ) {
        if let Ok(conn) = pool.get() {
            let _ = conn.execute(
                "INSERT INTO audit_log (admin_id, admin_name, action, entity_type, entity_id, entity_title)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![admin_id, admin_name, action, entity_type, entity_id, entity_title],
            );
        }
    }

    pub fn list(pool: &DbPool, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM audit_log ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![limit, offset], |row| {
            Ok(AuditEntry {
                id: row.get("id")?,
                admin_id: row.get("admin_id")?,
                admin_name: row.get("admin_name")?,
                action: row.get("action")?,
                entity_type: row.get("entity_type")?,
                entity_id: row.get("entity_id")?,
                entity_title: row.get("entity_title")?,
                created_at: row.get("created_at")?,
            })
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))
            .unwrap_or(0)
    }
}
