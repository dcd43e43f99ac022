use chrono::{Duration, Utc};
use rocket::http::{Cookie, CookieJar, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use rusqlite::params;

use crate::db::DbPool;
use crate::error::StoreResult;
use crate::models::admin::Admin;
use crate::models::settings::Setting;

const SESSION_COOKIE: &str = "lectern_session";

/// Guard: the request carries a valid admin session, either as an
/// `Authorization: Bearer <token>` header or the private session cookie.
pub struct AdminUser {
    pub admin: Admin,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let pool = match request.guard::<&State<DbPool>>().await {
            Outcome::Success(p) => p,
            _ => return Outcome::Forward(Status::Unauthorized),
        };

        let token = bearer_token(request).or_else(|| {
            request
                .cookies()
                .get_private(SESSION_COOKIE)
                .map(|c| c.value().to_string())
        });

        let token = match token {
            Some(t) => t,
            None => return Outcome::Forward(Status::Unauthorized),
        };

        match session_admin(pool, &token) {
            Some(admin) => Outcome::Success(AdminUser { admin }),
            None => {
                request.cookies().remove_private(Cookie::from(SESSION_COOKIE));
                Outcome::Forward(Status::Unauthorized)
            }
        }
    }
}

fn bearer_token(request: &Request<'_>) -> Option<String> {
    request
        .headers()
        .get_one("Authorization")
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

pub fn hash_password(password: &str) -> StoreResult<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| crate::error::StoreError::Database(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

pub fn create_session(
    pool: &DbPool,
    admin_id: i64,
    ip: Option<&str>,
    ua: Option<&str>,
) -> StoreResult<String> {
    let conn = pool.get()?;

    let expiry_hours = Setting::get_i64(pool, "session_expiry_hours").max(1);
    let token = uuid::Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();
    let expires = now + Duration::hours(expiry_hours);

    conn.execute(
        "INSERT INTO sessions (token, admin_id, created_at, expires_at, ip_address, user_agent)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![token, admin_id, now, expires, ip, ua],
    )?;

    Ok(token)
}

/// Resolve a session token to its admin, if the session is still live.
pub fn session_admin(pool: &DbPool, token: &str) -> Option<Admin> {
    let conn = pool.get().ok()?;
    let now = Utc::now().naive_utc();
    let admin_id: i64 = conn
        .query_row(
            "SELECT admin_id FROM sessions WHERE token = ?1 AND expires_at > ?2",
            params![token, now],
            |row| row.get(0),
        )
        .ok()?;
    Admin::get_by_id(pool, admin_id)
}

pub fn destroy_session(pool: &DbPool, token: &str) -> StoreResult<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

pub fn cleanup_expired_sessions(pool: &DbPool) -> StoreResult<()> {
    let conn = pool.get()?;
    let now = Utc::now().naive_utc();
    conn.execute("DELETE FROM sessions WHERE expires_at < ?1", params![now])?;
    Ok(())
}

pub fn set_session_cookie(cookies: &CookieJar<'_>, token: &str) {
    let mut cookie = Cookie::new(SESSION_COOKIE, token.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(rocket::http::SameSite::Strict);
    cookie.set_path("/");
    cookies.add_private(cookie);
}

pub fn clear_session_cookie(cookies: &CookieJar<'_>) {
    cookies.remove_private(Cookie::from(SESSION_COOKIE));
}

/// Guard: the raw session token the request authenticated with (for logout).
pub struct SessionToken(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionToken {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = bearer_token(request).or_else(|| {
            request
                .cookies()
                .get_private(SESSION_COOKIE)
                .map(|c| c.value().to_string())
        });
        match token {
            Some(t) => Outcome::Success(SessionToken(t)),
            None => Outcome::Forward(Status::Unauthorized),
        }
    }
}
