use rocket::http::CookieJar;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};

use super::parse_body;
use crate::auth::{self, AdminUser, SessionToken};
use crate::db::DbPool;
use crate::error::{ApiError, StoreError};
use crate::models::admin::Admin;
use crate::models::audit::AuditEntry;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[post("/register", format = "json", data = "<body>")]
pub fn register(pool: &State<DbPool>, body: Json<Value>) -> Result<Created<Json<Value>>, ApiError> {
    let req: RegisterRequest = parse_body(body.into_inner())?;
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(StoreError::validation("name is required").into());
    }
    if email.is_empty() || !email.contains('@') {
        return Err(StoreError::validation("a valid email is required").into());
    }
    if req.password.len() < 8 {
        return Err(StoreError::validation("password must be at least 8 characters").into());
    }

    let hash = auth::hash_password(&req.password)?;
    let id = Admin::create(pool, name, &email, &hash)?;
    let admin = Admin::get_by_id(pool, id).ok_or_else(ApiError::not_found)?;
    Ok(Created::new("/api/auth/me".to_string())
        .body(Json(json!({ "success": true, "admin": admin.safe_json() }))))
}

#[post("/login", format = "json", data = "<body>")]
pub fn login(
    pool: &State<DbPool>,
    cookies: &CookieJar<'_>,
    body: Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let req: LoginRequest = parse_body(body.into_inner())?;
    let email = req.email.trim().to_lowercase();

    // Uniform failure message: no account enumeration
    let admin = Admin::get_by_email(pool, &email)
        .filter(|a| auth::verify_password(&req.password, &a.password_hash))
        .ok_or_else(|| StoreError::Unauthorized("invalid email or password".to_string()))?;

    let token = auth::create_session(pool, admin.id, None, None)?;
    auth::set_session_cookie(cookies, &token);
    Admin::touch_last_login(pool, admin.id)?;
    AuditEntry::log(
        pool,
        Some(admin.id),
        Some(&admin.name),
        "login",
        Some("admin"),
        Some(admin.id),
        Some(&admin.email),
    );

    Ok(Json(json!({
        "success": true,
        "token": token,
        "admin": admin.safe_json(),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[post("/password", format = "json", data = "<body>")]
pub fn change_password(
    admin: AdminUser,
    pool: &State<DbPool>,
    body: Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let req: ChangePasswordRequest = parse_body(body.into_inner())?;

    if !auth::verify_password(&req.current_password, &admin.admin.password_hash) {
        return Err(StoreError::Unauthorized("current password is incorrect".to_string()).into());
    }
    if req.new_password.len() < 8 {
        return Err(StoreError::validation("password must be at least 8 characters").into());
    }

    let hash = auth::hash_password(&req.new_password)?;
    Admin::update_password(pool, admin.admin.id, &hash)?;
    AuditEntry::log(
        pool,
        Some(admin.admin.id),
        Some(&admin.admin.name),
        "change_password",
        Some("admin"),
        Some(admin.admin.id),
        None,
    );
    Ok(Json(json!({ "success": true })))
}

#[post("/logout")]
pub fn logout(
    _admin: AdminUser,
    token: SessionToken,
    pool: &State<DbPool>,
    cookies: &CookieJar<'_>,
) -> Result<Json<Value>, ApiError> {
    auth::destroy_session(pool, &token.0)?;
    auth::clear_session_cookie(cookies);
    Ok(Json(json!({ "success": true })))
}

#[get("/me")]
pub fn me(admin: AdminUser) -> Json<Value> {
    Json(json!({ "success": true, "admin": admin.admin.safe_json() }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![register, login, change_password, logout, me]
}
