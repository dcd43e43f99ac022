#![cfg(test)]

use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use rocket::http::{ContentType, Header, Status};
use rocket::local::blocking::Client;
use serde_json::Value;

use crate::auth;
use crate::db::{run_migrations, seed_defaults, DbPool};
use crate::error::StoreError;
use crate::models::admin::Admin;
use crate::models::audit::AuditEntry;
use crate::models::category::{Category, CategoryForm};
use crate::models::content::{ContentForm, ContentItem, ContentKind};
use crate::models::link::{Classification, Link};
use crate::models::settings::Setting;
use crate::models::tag::{Tag, TagForm};

/// Atomic counter for unique shared-cache DB names so parallel tests don't collide.
static TEST_DB_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Create a fresh in-memory SQLite pool with migrations + seed defaults applied.
/// Uses a named shared-cache in-memory DB so multiple connections see the same
/// data. Pre-seeds an admin with a fast bcrypt hash so seed_defaults skips the
/// expensive DEFAULT_COST hash (60s+ in debug builds).
fn test_pool() -> DbPool {
    let id = TEST_DB_COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let uri = format!("file:testdb_{}?mode=memory&cache=shared", id);
    let manager = SqliteConnectionManager::file(uri);
    let pool = Pool::builder()
        .max_size(2)
        .build(manager)
        .expect("Failed to create test pool");
    {
        let conn = pool.get().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    }
    run_migrations(&pool).expect("Failed to run migrations");
    {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO admins (name, email, password_hash) VALUES ('Admin', 'admin@localhost', ?1)",
            rusqlite::params![fast_hash("admin")],
        )
        .unwrap();
    }
    seed_defaults(&pool).expect("Failed to seed defaults");
    pool
}

/// Fast bcrypt hash for tests (cost=4 instead of DEFAULT_COST=12).
fn fast_hash(password: &str) -> String {
    bcrypt::hash(password, 4).unwrap()
}

fn seeded_admin(pool: &DbPool) -> Admin {
    Admin::get_by_email(pool, "admin@localhost").expect("seeded admin missing")
}

fn course_form(title: &str) -> ContentForm {
    ContentForm {
        title: title.to_string(),
        ..Default::default()
    }
}

fn video_form(title: &str, url: &str) -> ContentForm {
    ContentForm {
        title: title.to_string(),
        resource_url: Some(url.to_string()),
        ..Default::default()
    }
}

fn document_form(title: &str, file_path: &str) -> ContentForm {
    ContentForm {
        title: title.to_string(),
        file_path: Some(file_path.to_string()),
        ..Default::default()
    }
}

fn event_form(title: &str) -> ContentForm {
    ContentForm {
        title: title.to_string(),
        starts_at: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap().and_hms_opt(9, 0, 0),
        ..Default::default()
    }
}

// ═══════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════

#[test]
fn settings_set_and_get() {
    let pool = test_pool();
    Setting::set(&pool, "test_key", "hello").unwrap();
    assert_eq!(Setting::get(&pool, "test_key"), Some("hello".to_string()));
    assert_eq!(Setting::get_or(&pool, "missing", "fallback"), "fallback");
}

#[test]
fn settings_seeded_defaults() {
    let pool = test_pool();
    assert_eq!(Setting::get_i64(&pool, "uploads_max_mb"), 50);
    assert!(Setting::get_i64(&pool, "session_expiry_hours") > 0);
    assert!(Setting::all(&pool).len() >= 5);
}

// ═══════════════════════════════════════════════════════════
// Admins
// ═══════════════════════════════════════════════════════════

#[test]
fn admin_create_and_find() {
    let pool = test_pool();
    let id = Admin::create(&pool, "Jo", "jo@example.com", &fast_hash("pw")).unwrap();
    assert!(id > 0);

    let admin = Admin::get_by_id(&pool, id).expect("admin not found by id");
    assert_eq!(admin.email, "jo@example.com");
    let admin2 = Admin::get_by_email(&pool, "jo@example.com").unwrap();
    assert_eq!(admin2.id, id);
    assert_eq!(Admin::count(&pool), 2); // seeded admin + jo
}

#[test]
fn admin_duplicate_email_is_duplicate_error() {
    let pool = test_pool();
    Admin::create(&pool, "A", "dup@example.com", "h").unwrap();
    let err = Admin::create(&pool, "B", "dup@example.com", "h").unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
}

#[test]
fn admin_delete_orphans_content_and_drops_sessions() {
    let pool = test_pool();
    let id = Admin::create(&pool, "Jo", "jo@example.com", &fast_hash("pw")).unwrap();
    let content_id = ContentItem::create(&pool, ContentKind::Course, &course_form("C"), id).unwrap();
    let token = auth::create_session(&pool, id, None, None).unwrap();

    Admin::delete(&pool, id).unwrap();
    assert!(Admin::get_by_id(&pool, id).is_none());
    assert!(auth::session_admin(&pool, &token).is_none());

    let item = ContentItem::find_by_id(&pool, ContentKind::Course, content_id).unwrap();
    assert_eq!(item.created_by, None);
}

// ═══════════════════════════════════════════════════════════
// Content CRUD
// ═══════════════════════════════════════════════════════════

#[test]
fn course_crud() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);

    let id = ContentItem::create(&pool, ContentKind::Course, &course_form("Rust 101"), admin.id)
        .unwrap();
    assert!(id > 0);

    let item = ContentItem::find_by_id(&pool, ContentKind::Course, id).unwrap();
    assert_eq!(item.title, "Rust 101");
    assert_eq!(item.kind, ContentKind::Course);
    assert_eq!(item.clicks, 0);
    assert_eq!(item.created_by, Some(admin.id));

    // Wrong kind does not find it
    assert!(ContentItem::find_by_id(&pool, ContentKind::Event, id).is_none());

    let mut form = course_form("Rust 102");
    form.description = Some("updated".to_string());
    ContentItem::update(&pool, ContentKind::Course, id, &form).unwrap();
    let item = ContentItem::find_by_id(&pool, ContentKind::Course, id).unwrap();
    assert_eq!(item.title, "Rust 102");
    assert_eq!(item.description.as_deref(), Some("updated"));

    assert_eq!(ContentItem::count(&pool, ContentKind::Course), 1);
    assert_eq!(ContentItem::list(&pool, ContentKind::Course, 10, 0).len(), 1);

    ContentItem::delete(&pool, ContentKind::Course, id).unwrap();
    assert!(ContentItem::find_by_id(&pool, ContentKind::Course, id).is_none());
    assert_eq!(ContentItem::count(&pool, ContentKind::Course), 0);
}

#[test]
fn course_requires_title() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);
    let err = ContentItem::create(&pool, ContentKind::Course, &course_form("   "), admin.id)
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn course_rejects_malformed_resource_url() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);
    let mut form = course_form("C");
    form.resource_url = Some("not a url".to_string());
    let err = ContentItem::create(&pool, ContentKind::Course, &form, admin.id).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn video_course_derives_video_metadata() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);
    let id = ContentItem::create(
        &pool,
        ContentKind::VideoCourse,
        &video_form("Intro", "https://www.youtube.com/watch?v=abc123&t=5"),
        admin.id,
    )
    .unwrap();

    let item = ContentItem::find_by_id(&pool, ContentKind::VideoCourse, id).unwrap();
    assert_eq!(item.video_id.as_deref(), Some("abc123"));
    assert_eq!(
        item.thumbnail_url.as_deref(),
        Some("https://img.youtube.com/vi/abc123/hqdefault.jpg")
    );
}

#[test]
fn video_course_rejects_non_youtube_url() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);
    let err = ContentItem::create(
        &pool,
        ContentKind::VideoCourse,
        &video_form("Intro", "https://example.com/video"),
        admin.id,
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let err = ContentItem::create(
        &pool,
        ContentKind::VideoCourse,
        &course_form("No URL at all"),
        admin.id,
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn document_requires_allowed_file() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);

    let id = ContentItem::create(
        &pool,
        ContentKind::Document,
        &document_form("Syllabus", "syllabus.pdf"),
        admin.id,
    )
    .unwrap();
    assert!(ContentItem::find_by_id(&pool, ContentKind::Document, id).is_some());

    let err = ContentItem::create(
        &pool,
        ContentKind::Document,
        &document_form("Nope", "malware.exe"),
        admin.id,
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let err = ContentItem::create(&pool, ContentKind::Document, &course_form("No file"), admin.id)
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn event_requires_start_and_ordered_times() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);

    let id = ContentItem::create(&pool, ContentKind::Event, &event_form("Meetup"), admin.id)
        .unwrap();
    assert!(ContentItem::find_by_id(&pool, ContentKind::Event, id).is_some());

    // Missing start
    let err = ContentItem::create(&pool, ContentKind::Event, &course_form("No start"), admin.id)
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    // Ends before it starts
    let mut form = event_form("Backwards");
    form.ends_at = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap().and_hms_opt(9, 0, 0);
    let err = ContentItem::create(&pool, ContentKind::Event, &form, admin.id).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn update_missing_item_is_not_found() {
    let pool = test_pool();
    let err = ContentItem::update(&pool, ContentKind::Course, 9999, &course_form("X")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound));

    let err = ContentItem::delete(&pool, ContentKind::Course, 9999).unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

// ═══════════════════════════════════════════════════════════
// Click counter
// ═══════════════════════════════════════════════════════════

#[test]
fn clicks_increment_monotonically() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);
    let id = ContentItem::create(&pool, ContentKind::Course, &course_form("C"), admin.id).unwrap();

    assert_eq!(ContentItem::increment_clicks(&pool, ContentKind::Course, id).unwrap(), 1);
    assert_eq!(ContentItem::increment_clicks(&pool, ContentKind::Course, id).unwrap(), 2);
    assert_eq!(ContentItem::increment_clicks(&pool, ContentKind::Course, id).unwrap(), 3);
}

#[test]
fn clicks_survive_general_update() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);
    let id = ContentItem::create(&pool, ContentKind::Course, &course_form("C"), admin.id).unwrap();
    ContentItem::increment_clicks(&pool, ContentKind::Course, id).unwrap();
    ContentItem::increment_clicks(&pool, ContentKind::Course, id).unwrap();

    ContentItem::update(&pool, ContentKind::Course, id, &course_form("Renamed")).unwrap();
    let item = ContentItem::find_by_id(&pool, ContentKind::Course, id).unwrap();
    assert_eq!(item.clicks, 2);
}

#[test]
fn click_on_missing_item_is_not_found() {
    let pool = test_pool();
    let err = ContentItem::increment_clicks(&pool, ContentKind::Event, 42).unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

// ═══════════════════════════════════════════════════════════
// Categories & Tags
// ═══════════════════════════════════════════════════════════

fn make_category(pool: &DbPool, name: &str) -> i64 {
    Category::create(
        pool,
        &CategoryForm {
            name: name.to_string(),
            slug: None,
        },
    )
    .unwrap()
}

fn make_tag(pool: &DbPool, name: &str) -> i64 {
    Tag::create(
        pool,
        &TagForm {
            name: name.to_string(),
            slug: None,
        },
    )
    .unwrap()
}

#[test]
fn category_crud() {
    let pool = test_pool();
    let id = make_category(&pool, "Programming");

    let cat = Category::find_by_id(&pool, id).unwrap();
    assert_eq!(cat.name, "Programming");
    assert_eq!(cat.slug, "programming");
    assert_eq!(Category::find_by_slug(&pool, "programming").unwrap().id, id);

    Category::update(
        &pool,
        id,
        &CategoryForm {
            name: "Coding".to_string(),
            slug: None,
        },
    )
    .unwrap();
    assert_eq!(Category::find_by_id(&pool, id).unwrap().name, "Coding");

    assert_eq!(Category::count(&pool), 1);
    Category::delete(&pool, id).unwrap();
    assert!(Category::find_by_id(&pool, id).is_none());
}

#[test]
fn category_duplicate_name_is_duplicate_error() {
    let pool = test_pool();
    make_category(&pool, "Tech");
    let err = Category::create(
        &pool,
        &CategoryForm {
            name: "Tech".to_string(),
            slug: Some("tech-2".to_string()),
        },
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
}

#[test]
fn category_name_uniqueness_is_case_insensitive() {
    let pool = test_pool();
    make_category(&pool, "Tech");
    let err = Category::create(
        &pool,
        &CategoryForm {
            name: "tech".to_string(),
            slug: Some("tech-lower".to_string()),
        },
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
}

#[test]
fn category_requires_name() {
    let pool = test_pool();
    let err = Category::create(
        &pool,
        &CategoryForm {
            name: "  ".to_string(),
            slug: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn tag_crud_and_duplicates() {
    let pool = test_pool();
    let id = make_tag(&pool, "rust");
    assert_eq!(Tag::find_by_id(&pool, id).unwrap().name, "rust");
    assert_eq!(Tag::find_by_slug(&pool, "rust").unwrap().id, id);

    let err = Tag::create(
        &pool,
        &TagForm {
            name: "Rust".to_string(),
            slug: Some("rust-2".to_string()),
        },
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));

    Tag::delete(&pool, id).unwrap();
    assert!(Tag::find_by_id(&pool, id).is_none());
    assert!(matches!(Tag::delete(&pool, id).unwrap_err(), StoreError::NotFound));
}

// ═══════════════════════════════════════════════════════════
// Associations
// ═══════════════════════════════════════════════════════════

#[test]
fn attach_is_idempotent() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);
    let content_id =
        ContentItem::create(&pool, ContentKind::Course, &course_form("C"), admin.id).unwrap();
    let tag_id = make_tag(&pool, "beginner");

    Link::attach(&pool, content_id, Classification::Tag, tag_id).unwrap();
    // Second attach of the same pair: no error, no second row
    Link::attach(&pool, content_id, Classification::Tag, tag_id).unwrap();

    assert!(Link::exists(&pool, content_id, Classification::Tag, tag_id));
    assert_eq!(Tag::count_items(&pool, tag_id), 1);
}

#[test]
fn attach_missing_either_side_is_not_found() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);
    let content_id =
        ContentItem::create(&pool, ContentKind::Course, &course_form("C"), admin.id).unwrap();
    let cat_id = make_category(&pool, "Tech");

    let err = Link::attach(&pool, 9999, Classification::Category, cat_id).unwrap_err();
    assert!(matches!(err, StoreError::NotFound));

    let err = Link::attach(&pool, content_id, Classification::Category, 9999).unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[test]
fn detach_is_strict() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);
    let content_id =
        ContentItem::create(&pool, ContentKind::Course, &course_form("C"), admin.id).unwrap();
    let tag_id = make_tag(&pool, "beginner");

    // Never attached
    let err = Link::detach(&pool, content_id, Classification::Tag, tag_id).unwrap_err();
    assert!(matches!(err, StoreError::NotFound));

    Link::attach(&pool, content_id, Classification::Tag, tag_id).unwrap();
    Link::detach(&pool, content_id, Classification::Tag, tag_id).unwrap();
    assert!(!Link::exists(&pool, content_id, Classification::Tag, tag_id));

    // Detaching again is NotFound, not a silent no-op
    let err = Link::detach(&pool, content_id, Classification::Tag, tag_id).unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[test]
fn deleting_content_removes_its_links() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);
    let content_id =
        ContentItem::create(&pool, ContentKind::Event, &event_form("Meetup"), admin.id).unwrap();
    let cat_id = make_category(&pool, "Community");
    let tag_id = make_tag(&pool, "free");

    Link::attach(&pool, content_id, Classification::Category, cat_id).unwrap();
    Link::attach(&pool, content_id, Classification::Tag, tag_id).unwrap();

    ContentItem::delete(&pool, ContentKind::Event, content_id).unwrap();

    assert_eq!(Category::count_items(&pool, cat_id), 0);
    assert_eq!(Tag::count_items(&pool, tag_id), 0);
    assert!(Category::for_content(&pool, content_id).is_empty());
    assert!(Tag::for_content(&pool, content_id).is_empty());
}

#[test]
fn deleting_classification_removes_its_links() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);
    let a = ContentItem::create(&pool, ContentKind::Course, &course_form("A"), admin.id).unwrap();
    let b = ContentItem::create(&pool, ContentKind::Course, &course_form("B"), admin.id).unwrap();
    let cat_id = make_category(&pool, "Doomed");

    Link::attach(&pool, a, Classification::Category, cat_id).unwrap();
    Link::attach(&pool, b, Classification::Category, cat_id).unwrap();

    Category::delete(&pool, cat_id).unwrap();
    assert!(Category::for_content(&pool, a).is_empty());
    assert!(Category::for_content(&pool, b).is_empty());
}

#[test]
fn listing_filters_by_category_and_tag() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);
    let a = ContentItem::create(&pool, ContentKind::Course, &course_form("A"), admin.id).unwrap();
    let b = ContentItem::create(&pool, ContentKind::Course, &course_form("B"), admin.id).unwrap();
    let cat_id = make_category(&pool, "Tech");
    let tag_id = make_tag(&pool, "rust");

    Link::attach(&pool, a, Classification::Category, cat_id).unwrap();
    Link::attach(&pool, b, Classification::Tag, tag_id).unwrap();

    let by_cat = ContentItem::by_category(&pool, ContentKind::Course, cat_id, 10, 0);
    assert_eq!(by_cat.len(), 1);
    assert_eq!(by_cat[0].id, a);

    let by_tag = ContentItem::by_tag(&pool, ContentKind::Course, tag_id, 10, 0);
    assert_eq!(by_tag.len(), 1);
    assert_eq!(by_tag[0].id, b);
}

// ═══════════════════════════════════════════════════════════
// Auth & sessions
// ═══════════════════════════════════════════════════════════

#[test]
fn password_hash_roundtrip() {
    let hash = fast_hash("hunter2");
    assert!(auth::verify_password("hunter2", &hash));
    assert!(!auth::verify_password("wrong", &hash));
}

#[test]
fn session_lifecycle() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);

    let token = auth::create_session(&pool, admin.id, Some("127.0.0.1"), None).unwrap();
    let resolved = auth::session_admin(&pool, &token).expect("session should resolve");
    assert_eq!(resolved.id, admin.id);

    auth::destroy_session(&pool, &token).unwrap();
    assert!(auth::session_admin(&pool, &token).is_none());
}

#[test]
fn expired_sessions_do_not_resolve() {
    let pool = test_pool();
    let admin = seeded_admin(&pool);
    let token = auth::create_session(&pool, admin.id, None, None).unwrap();

    // Force the session into the past
    let conn = pool.get().unwrap();
    conn.execute(
        "UPDATE sessions SET expires_at = '2000-01-01 00:00:00' WHERE token = ?1",
        rusqlite::params![token],
    )
    .unwrap();

    assert!(auth::session_admin(&pool, &token).is_none());
    auth::cleanup_expired_sessions(&pool).unwrap();
    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

// ═══════════════════════════════════════════════════════════
// Audit trail
// ═══════════════════════════════════════════════════════════

#[test]
fn audit_log_records_entries() {
    let pool = test_pool();
    AuditEntry::log(
        &pool,
        Some(1),
        Some("Admin"),
        "delete",
        Some("course"),
        Some(42),
        Some("Rust 101"),
    );
    let entries = AuditEntry::list(&pool, 10, 0);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "delete");
    assert_eq!(entries[0].entity_id, Some(42));
    assert_eq!(AuditEntry::count(&pool), 1);
}

// ═══════════════════════════════════════════════════════════
// HTTP surface
// ═══════════════════════════════════════════════════════════

fn test_client() -> Client {
    Client::tracked(crate::build_rocket(test_pool())).expect("valid rocket instance")
}

fn login(client: &Client) -> String {
    let res = client
        .post("/api/auth/login")
        .header(ContentType::JSON)
        .body(r#"{"email":"admin@localhost","password":"admin"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: Value = res.into_json().unwrap();
    body["token"].as_str().unwrap().to_string()
}

fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {}", token))
}

#[test]
fn mutations_require_authentication() {
    let client = test_client();
    let res = client
        .post("/api/courses")
        .header(ContentType::JSON)
        .body(r#"{"title":"Nope"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Unauthorized);

    let res = client.delete("/api/categories/1").dispatch();
    assert_eq!(res.status(), Status::Unauthorized);
}

#[test]
fn login_rejects_bad_credentials() {
    let client = test_client();
    let res = client
        .post("/api/auth/login")
        .header(ContentType::JSON)
        .body(r#"{"email":"admin@localhost","password":"wrong"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Unauthorized);
}

#[test]
fn register_duplicate_email_conflicts() {
    let client = test_client();
    let body = r#"{"name":"Jo","email":"jo@example.com","password":"longenough"}"#;
    let res = client
        .post("/api/auth/register")
        .header(ContentType::JSON)
        .body(body)
        .dispatch();
    assert_eq!(res.status(), Status::Created);

    let res = client
        .post("/api/auth/register")
        .header(ContentType::JSON)
        .body(body)
        .dispatch();
    assert_eq!(res.status(), Status::Conflict);
}

#[test]
fn content_create_read_click_delete_over_http() {
    let client = test_client();
    let token = login(&client);

    let res = client
        .post("/api/courses")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(r#"{"title":"Rust 101","description":"intro"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Created);
    let body: Value = res.into_json().unwrap();
    let id = body["item"]["id"].as_i64().unwrap();

    // Public read
    let res = client.get(format!("/api/courses/{}", id)).dispatch();
    assert_eq!(res.status(), Status::Ok);

    // Public click
    let res = client.post(format!("/api/courses/{}/click", id)).dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: Value = res.into_json().unwrap();
    assert_eq!(body["clicks"].as_i64(), Some(1));

    // Delete, then the read 404s
    let res = client
        .delete(format!("/api/courses/{}", id))
        .header(bearer(&token))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let res = client.get(format!("/api/courses/{}", id)).dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn unknown_field_is_a_bad_request() {
    let client = test_client();
    let token = login(&client);
    let res = client
        .post("/api/courses")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(r#"{"title":"X","clicks":100}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn duplicate_category_is_a_conflict_over_http() {
    let client = test_client();
    let token = login(&client);

    let res = client
        .post("/api/categories")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(r#"{"name":"Tech"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Created);

    let res = client
        .post("/api/categories")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(r#"{"name":"tech","slug":"tech-2"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Conflict);
}

#[test]
fn attach_and_detach_over_http() {
    let client = test_client();
    let token = login(&client);

    let res = client
        .post("/api/events")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(r#"{"title":"Meetup","starts_at":"2026-09-01T09:00:00"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Created);
    let body: Value = res.into_json().unwrap();
    let event_id = body["item"]["id"].as_i64().unwrap();

    let res = client
        .post("/api/tags")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(r#"{"name":"free"}"#)
        .dispatch();
    let body: Value = res.into_json().unwrap();
    let tag_id = body["tag"]["id"].as_i64().unwrap();

    // Attach twice: both succeed
    for _ in 0..2 {
        let res = client
            .post(format!("/api/events/{}/tags", event_id))
            .header(ContentType::JSON)
            .header(bearer(&token))
            .body(format!(r#"{{"id":{}}}"#, tag_id))
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
    }

    let res = client.get(format!("/api/events/{}/tags", event_id)).dispatch();
    let body: Value = res.into_json().unwrap();
    assert_eq!(body["tags"].as_array().unwrap().len(), 1);

    // Detach, then a second detach 404s
    let res = client
        .delete(format!("/api/events/{}/tags/{}", event_id, tag_id))
        .header(bearer(&token))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let res = client
        .delete(format!("/api/events/{}/tags/{}", event_id, tag_id))
        .header(bearer(&token))
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn video_course_rejected_over_http_for_bad_url() {
    let client = test_client();
    let token = login(&client);
    let res = client
        .post("/api/videoCourses")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(r#"{"title":"V","resource_url":"https://example.com/video"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn logout_invalidates_token() {
    let client = test_client();
    let token = login(&client);

    let res = client
        .post("/api/auth/logout")
        .header(bearer(&token))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    // Cookie was cleared and the token is dead
    let res = client
        .post("/api/courses")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(r#"{"title":"X"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Unauthorized);
}
