use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

pub fn init_pool() -> Result<DbPool, Box<dyn std::error::Error>> {
    let manager = SqliteConnectionManager::file("data/db/lectern.db");
    let pool = Pool::builder().max_size(10).build(manager)?;

    // Enable WAL mode for better concurrent read performance
    let conn = pool.get()?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        -- Admin accounts
        CREATE TABLE IF NOT EXISTS admins (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            last_login_at DATETIME,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Catalog content (courses, video courses, documents, events)
        CREATE TABLE IF NOT EXISTS content (
            id INTEGER PRIMARY KEY,
            kind TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            resource_url TEXT,
            video_id TEXT,
            thumbnail_url TEXT,
            file_path TEXT,
            starts_at DATETIME,
            ends_at DATETIME,
            location TEXT,
            clicks INTEGER NOT NULL DEFAULT 0,
            created_by INTEGER REFERENCES admins(id),
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_content_kind ON content(kind);

        -- Categories (name uniqueness is case-insensitive)
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL COLLATE NOCASE UNIQUE,
            slug TEXT UNIQUE NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Tags (same shape as categories)
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL COLLATE NOCASE UNIQUE,
            slug TEXT UNIQUE NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Many-to-many: content <-> categories
        CREATE TABLE IF NOT EXISTS content_categories (
            content_id INTEGER NOT NULL REFERENCES content(id),
            category_id INTEGER NOT NULL REFERENCES categories(id),
            UNIQUE(content_id, category_id)
        );

        -- Many-to-many: content <-> tags
        CREATE TABLE IF NOT EXISTS content_tags (
            content_id INTEGER NOT NULL REFERENCES content(id),
            tag_id INTEGER NOT NULL REFERENCES tags(id),
            UNIQUE(content_id, tag_id)
        );

        -- Admin sessions
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            admin_id INTEGER NOT NULL REFERENCES admins(id),
            created_at DATETIME NOT NULL,
            expires_at DATETIME NOT NULL,
            ip_address TEXT,
            user_agent TEXT
        );

        -- Settings (key-value)
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        );

        -- Audit trail for admin mutations
        CREATE TABLE IF NOT EXISTS audit_log (
            id INTEGER PRIMARY KEY,
            admin_id INTEGER,
            admin_name TEXT,
            action TEXT NOT NULL,
            entity_type TEXT,
            entity_id INTEGER,
            entity_title TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        ",
    )?;

    Ok(())
}

pub fn seed_defaults(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    let defaults = vec![
        // General
        ("site_name", "Lectern"),
        ("site_url", "http://localhost:8000"),
        // Security
        ("session_expiry_hours", "24"),
        // Uploads
        ("uploads_storage_path", "data/uploads/"),
        ("uploads_max_mb", "50"),
        ("uploads_thumb_size", "300x300"),
        // Listings
        ("catalog_items_per_page", "20"),
    ];

    for (key, value) in defaults {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
    }

    // Seed default admin if no accounts exist
    let admin_count: i64 = conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?;

    if admin_count == 0 {
        // Default password: "admin" — must be changed after first login
        let hash = bcrypt::hash("admin", bcrypt::DEFAULT_COST)?;
        conn.execute(
            "INSERT INTO admins (name, email, password_hash) VALUES (?1, ?2, ?3)",
            params!["Admin", "admin@localhost", hash],
        )?;
        log::warn!("Seeded default admin account (admin@localhost / admin) — change the password");
    }

    Ok(())
}
