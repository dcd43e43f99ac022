use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::category::Category;
use crate::models::content::{ContentItem, ContentKind};
use crate::models::settings::Setting;
use crate::models::tag::Tag;

// ── Content listings ───────────────────────────────────

#[get("/<kind>?<category>&<tag>&<page>")]
pub fn content_list(
    pool: &State<DbPool>,
    kind: ContentKind,
    category: Option<i64>,
    tag: Option<i64>,
    page: Option<i64>,
) -> Json<Value> {
    let per_page = Setting::get_i64(pool, "catalog_items_per_page").max(1);
    let current_page = page.unwrap_or(1).max(1);
    let offset = (current_page - 1) * per_page;

    let items = match (category, tag) {
        (Some(cat_id), _) => ContentItem::by_category(pool, kind, cat_id, per_page, offset),
        (None, Some(tag_id)) => ContentItem::by_tag(pool, kind, tag_id, per_page, offset),
        (None, None) => ContentItem::list(pool, kind, per_page, offset),
    };
    let total = ContentItem::count(pool, kind);

    Json(json!({
        "success": true,
        "items": items,
        "page": current_page,
        "total": total,
    }))
}

#[get("/<kind>/<id>")]
pub fn content_get(pool: &State<DbPool>, kind: ContentKind, id: i64) -> Result<Json<Value>, ApiError> {
    let item = ContentItem::find_by_id(pool, kind, id).ok_or_else(ApiError::not_found)?;
    let categories = Category::for_content(pool, item.id);
    let tags = Tag::for_content(pool, item.id);
    Ok(Json(json!({
        "success": true,
        "item": item,
        "categories": categories,
        "tags": tags,
    })))
}

#[get("/<kind>/<id>/categories")]
pub fn content_categories(
    pool: &State<DbPool>,
    kind: ContentKind,
    id: i64,
) -> Result<Json<Value>, ApiError> {
    let item = ContentItem::find_by_id(pool, kind, id).ok_or_else(ApiError::not_found)?;
    Ok(Json(json!({
        "success": true,
        "categories": Category::for_content(pool, item.id),
    })))
}

#[get("/<kind>/<id>/tags")]
pub fn content_tags(
    pool: &State<DbPool>,
    kind: ContentKind,
    id: i64,
) -> Result<Json<Value>, ApiError> {
    let item = ContentItem::find_by_id(pool, kind, id).ok_or_else(ApiError::not_found)?;
    Ok(Json(json!({
        "success": true,
        "tags": Tag::for_content(pool, item.id),
    })))
}

// ── Click counter ──────────────────────────────────────

#[post("/<kind>/<id>/click")]
pub fn content_click(pool: &State<DbPool>, kind: ContentKind, id: i64) -> Result<Json<Value>, ApiError> {
    let clicks = ContentItem::increment_clicks(pool, kind, id)?;
    Ok(Json(json!({ "success": true, "clicks": clicks })))
}

// ── Categories / Tags ──────────────────────────────────

#[get("/categories")]
pub fn categories_list(pool: &State<DbPool>) -> Json<Value> {
    let categories: Vec<Value> = Category::list(pool)
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "name": c.name,
                "slug": c.slug,
                "count": Category::count_items(pool, c.id),
            })
        })
        .collect();
    Json(json!({ "success": true, "categories": categories }))
}

#[get("/categories/<id>")]
pub fn category_get(pool: &State<DbPool>, id: i64) -> Result<Json<Value>, ApiError> {
    let category = Category::find_by_id(pool, id).ok_or_else(ApiError::not_found)?;
    Ok(Json(json!({
        "success": true,
        "category": category,
        "count": Category::count_items(pool, id),
    })))
}

#[get("/tags")]
pub fn tags_list(pool: &State<DbPool>) -> Json<Value> {
    let tags: Vec<Value> = Tag::list(pool)
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "name": t.name,
                "slug": t.slug,
                "count": Tag::count_items(pool, t.id),
            })
        })
        .collect();
    Json(json!({ "success": true, "tags": tags }))
}

#[get("/tags/<id>")]
pub fn tag_get(pool: &State<DbPool>, id: i64) -> Result<Json<Value>, ApiError> {
    let tag = Tag::find_by_id(pool, id).ok_or_else(ApiError::not_found)?;
    Ok(Json(json!({
        "success": true,
        "tag": tag,
        "count": Tag::count_items(pool, id),
    })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        content_list,
        content_get,
        content_categories,
        content_tags,
        content_click,
        categories_list,
        category_get,
        tags_list,
        tag_get,
    ]
}
