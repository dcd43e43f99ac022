use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::tokio::io::AsyncReadExt;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};

use super::parse_body;
use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::error::{ApiError, StoreError};
use crate::models::audit::AuditEntry;
use crate::models::category::{Category, CategoryForm};
use crate::models::content::{ContentForm, ContentItem, ContentKind};
use crate::models::link::{Classification, Link};
use crate::models::tag::{Tag, TagForm};
use crate::uploads;

// ── Content CRUD ───────────────────────────────────────

#[post("/<kind>", format = "json", data = "<body>")]
pub fn content_create(
    admin: AdminUser,
    pool: &State<DbPool>,
    kind: ContentKind,
    body: Json<Value>,
) -> Result<Created<Json<Value>>, ApiError> {
    let form: ContentForm = parse_body(body.into_inner())?;
    let id = ContentItem::create(pool, kind, &form, admin.admin.id)?;
    let item = ContentItem::find_by_id(pool, kind, id).ok_or_else(ApiError::not_found)?;
    AuditEntry::log(
        pool,
        Some(admin.admin.id),
        Some(&admin.admin.name),
        "create",
        Some(kind.as_str()),
        Some(id),
        Some(&item.title),
    );
    let location = format!("/api/{}/{}", kind.route_str(), id);
    Ok(Created::new(location).body(Json(json!({ "success": true, "item": item }))))
}

#[put("/<kind>/<id>", format = "json", data = "<body>")]
pub fn content_update(
    admin: AdminUser,
    pool: &State<DbPool>,
    kind: ContentKind,
    id: i64,
    body: Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let form: ContentForm = parse_body(body.into_inner())?;
    ContentItem::update(pool, kind, id, &form)?;
    let item = ContentItem::find_by_id(pool, kind, id).ok_or_else(ApiError::not_found)?;
    AuditEntry::log(
        pool,
        Some(admin.admin.id),
        Some(&admin.admin.name),
        "update",
        Some(kind.as_str()),
        Some(id),
        Some(&item.title),
    );
    Ok(Json(json!({ "success": true, "item": item })))
}

#[delete("/<kind>/<id>")]
pub fn content_delete(
    admin: AdminUser,
    pool: &State<DbPool>,
    kind: ContentKind,
    id: i64,
) -> Result<Json<Value>, ApiError> {
    let title = ContentItem::find_by_id(pool, kind, id)
        .map(|i| i.title)
        .unwrap_or_default();
    ContentItem::delete(pool, kind, id)?;
    AuditEntry::log(
        pool,
        Some(admin.admin.id),
        Some(&admin.admin.name),
        "delete",
        Some(kind.as_str()),
        Some(id),
        Some(&title),
    );
    Ok(Json(json!({ "success": true })))
}

// ── Category CRUD ──────────────────────────────────────

#[post("/categories", format = "json", data = "<body>")]
pub fn category_create(
    admin: AdminUser,
    pool: &State<DbPool>,
    body: Json<Value>,
) -> Result<Created<Json<Value>>, ApiError> {
    let form: CategoryForm = parse_body(body.into_inner())?;
    let id = Category::create(pool, &form)?;
    let category = Category::find_by_id(pool, id).ok_or_else(ApiError::not_found)?;
    AuditEntry::log(
        pool,
        Some(admin.admin.id),
        Some(&admin.admin.name),
        "create",
        Some("category"),
        Some(id),
        Some(&category.name),
    );
    Ok(Created::new(format!("/api/categories/{}", id))
        .body(Json(json!({ "success": true, "category": category }))))
}

#[put("/categories/<id>", format = "json", data = "<body>")]
pub fn category_update(
    admin: AdminUser,
    pool: &State<DbPool>,
    id: i64,
    body: Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let form: CategoryForm = parse_body(body.into_inner())?;
    Category::update(pool, id, &form)?;
    let category = Category::find_by_id(pool, id).ok_or_else(ApiError::not_found)?;
    AuditEntry::log(
        pool,
        Some(admin.admin.id),
        Some(&admin.admin.name),
        "update",
        Some("category"),
        Some(id),
        Some(&category.name),
    );
    Ok(Json(json!({ "success": true, "category": category })))
}

#[delete("/categories/<id>")]
pub fn category_delete(
    admin: AdminUser,
    pool: &State<DbPool>,
    id: i64,
) -> Result<Json<Value>, ApiError> {
    let name = Category::find_by_id(pool, id).map(|c| c.name).unwrap_or_default();
    Category::delete(pool, id)?;
    AuditEntry::log(
        pool,
        Some(admin.admin.id),
        Some(&admin.admin.name),
        "delete",
        Some("category"),
        Some(id),
        Some(&name),
    );
    Ok(Json(json!({ "success": true })))
}

// ── Tag CRUD ───────────────────────────────────────────

#[post("/tags", format = "json", data = "<body>")]
pub fn tag_create(
    admin: AdminUser,
    pool: &State<DbPool>,
    body: Json<Value>,
) -> Result<Created<Json<Value>>, ApiError> {
    let form: TagForm = parse_body(body.into_inner())?;
    let id = Tag::create(pool, &form)?;
    let tag = Tag::find_by_id(pool, id).ok_or_else(ApiError::not_found)?;
    AuditEntry::log(
        pool,
        Some(admin.admin.id),
        Some(&admin.admin.name),
        "create",
        Some("tag"),
        Some(id),
        Some(&tag.name),
    );
    Ok(Created::new(format!("/api/tags/{}", id)).body(Json(json!({ "success": true, "tag": tag }))))
}

#[put("/tags/<id>", format = "json", data = "<body>")]
pub fn tag_update(
    admin: AdminUser,
    pool: &State<DbPool>,
    id: i64,
    body: Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let form: TagForm = parse_body(body.into_inner())?;
    Tag::update(pool, id, &form)?;
    let tag = Tag::find_by_id(pool, id).ok_or_else(ApiError::not_found)?;
    AuditEntry::log(
        pool,
        Some(admin.admin.id),
        Some(&admin.admin.name),
        "update",
        Some("tag"),
        Some(id),
        Some(&tag.name),
    );
    Ok(Json(json!({ "success": true, "tag": tag })))
}

#[delete("/tags/<id>")]
pub fn tag_delete(admin: AdminUser, pool: &State<DbPool>, id: i64) -> Result<Json<Value>, ApiError> {
    let name = Tag::find_by_id(pool, id).map(|t| t.name).unwrap_or_default();
    Tag::delete(pool, id)?;
    AuditEntry::log(
        pool,
        Some(admin.admin.id),
        Some(&admin.admin.name),
        "delete",
        Some("tag"),
        Some(id),
        Some(&name),
    );
    Ok(Json(json!({ "success": true })))
}

// ── Associations ───────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttachBody {
    pub id: i64,
}

#[post("/<kind>/<id>/<class>", format = "json", data = "<body>")]
pub fn link_attach(
    admin: AdminUser,
    pool: &State<DbPool>,
    kind: ContentKind,
    id: i64,
    class: Classification,
    body: Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let req: AttachBody = parse_body(body.into_inner())?;
    // Scope the content lookup to the kind in the URL
    let item = ContentItem::find_by_id(pool, kind, id).ok_or_else(ApiError::not_found)?;
    Link::attach(pool, item.id, class, req.id)?;
    AuditEntry::log(
        pool,
        Some(admin.admin.id),
        Some(&admin.admin.name),
        "attach",
        Some(kind.as_str()),
        Some(id),
        Some(&item.title),
    );
    Ok(Json(json!({ "success": true })))
}

#[delete("/<kind>/<id>/<class>/<link_id>")]
pub fn link_detach(
    admin: AdminUser,
    pool: &State<DbPool>,
    kind: ContentKind,
    id: i64,
    class: Classification,
    link_id: i64,
) -> Result<Json<Value>, ApiError> {
    let item = ContentItem::find_by_id(pool, kind, id).ok_or_else(ApiError::not_found)?;
    Link::detach(pool, item.id, class, link_id)?;
    AuditEntry::log(
        pool,
        Some(admin.admin.id),
        Some(&admin.admin.name),
        "detach",
        Some(kind.as_str()),
        Some(id),
        Some(&item.title),
    );
    Ok(Json(json!({ "success": true })))
}

// ── Uploads ────────────────────────────────────────────

#[derive(FromForm)]
pub struct UploadForm<'f> {
    pub file: TempFile<'f>,
}

fn original_filename(file: &TempFile<'_>) -> String {
    file.raw_name()
        .map(|n| n.dangerous_unsafe_unsanitized_raw().as_str().to_string())
        .unwrap_or_default()
}

fn declared_mime(file: &TempFile<'_>) -> String {
    file.content_type()
        .map(|ct| format!("{}/{}", ct.top(), ct.sub()))
        .unwrap_or_default()
}

async fn read_temp_file(file: &mut TempFile<'_>) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    let mut f = file
        .open()
        .await
        .map_err(|e| ApiError(StoreError::Database(e.to_string())))?;
    f.read_to_end(&mut bytes)
        .await
        .map_err(|e| ApiError(StoreError::Database(e.to_string())))?;
    Ok(bytes)
}

#[post("/upload/image", data = "<form>")]
pub async fn upload_image(
    admin: AdminUser,
    pool: &State<DbPool>,
    mut form: Form<UploadForm<'_>>,
) -> Result<Json<Value>, ApiError> {
    let filename = original_filename(&form.file);
    let mime = declared_mime(&form.file);
    let bytes = read_temp_file(&mut form.file).await?;
    let saved = uploads::store_image(pool, &bytes, &filename, &mime)?;
    AuditEntry::log(
        pool,
        Some(admin.admin.id),
        Some(&admin.admin.name),
        "upload",
        Some("image"),
        None,
        Some(&saved.file_path),
    );
    Ok(Json(json!({
        "success": true,
        "file_path": saved.file_path,
        "thumbnail_path": saved.thumbnail_path,
    })))
}

#[post("/upload/document", data = "<form>")]
pub async fn upload_document(
    admin: AdminUser,
    pool: &State<DbPool>,
    mut form: Form<UploadForm<'_>>,
) -> Result<Json<Value>, ApiError> {
    let filename = original_filename(&form.file);
    let bytes = read_temp_file(&mut form.file).await?;
    let saved = uploads::store_document(pool, &bytes, &filename)?;
    AuditEntry::log(
        pool,
        Some(admin.admin.id),
        Some(&admin.admin.name),
        "upload",
        Some("document"),
        None,
        Some(&saved.file_path),
    );
    Ok(Json(json!({
        "success": true,
        "file_path": saved.file_path,
    })))
}

#[delete("/upload/<filename>")]
pub fn upload_delete(
    admin: AdminUser,
    pool: &State<DbPool>,
    filename: String,
) -> Result<Json<Value>, ApiError> {
    uploads::delete_upload(pool, &filename);
    AuditEntry::log(
        pool,
        Some(admin.admin.id),
        Some(&admin.admin.name),
        "delete",
        Some("upload"),
        None,
        Some(&filename),
    );
    Ok(Json(json!({ "success": true })))
}

// ── Audit trail ────────────────────────────────────────

#[get("/audit?<page>")]
pub fn audit_list(_admin: AdminUser, pool: &State<DbPool>, page: Option<i64>) -> Json<Value> {
    let per_page = 50i64;
    let current_page = page.unwrap_or(1).max(1);
    let offset = (current_page - 1) * per_page;
    let entries = AuditEntry::list(pool, per_page, offset);
    Json(json!({
        "success": true,
        "entries": entries,
        "page": current_page,
        "total": AuditEntry::count(pool),
    }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        content_create,
        content_update,
        content_delete,
        category_create,
        category_update,
        category_delete,
        tag_create,
        tag_update,
        tag_delete,
        link_attach,
        link_detach,
        upload_image,
        upload_document,
        upload_delete,
        audit_list,
    ]
}
