#[macro_use]
extern crate rocket;

use rocket::serde::json::Json;
use rocket::{Build, Rocket};
use serde_json::{json, Value};

mod auth;
mod boot;
mod db;
mod error;
mod uploads;
mod validate;

mod models;
mod routes;

#[cfg(test)]
mod tests;

use db::DbPool;

#[catch(400)]
fn bad_request() -> Json<Value> {
    Json(json!({ "success": false, "message": "bad request" }))
}

#[catch(401)]
fn unauthorized() -> Json<Value> {
    Json(json!({ "success": false, "message": "authentication required" }))
}

#[catch(403)]
fn forbidden() -> Json<Value> {
    Json(json!({ "success": false, "message": "forbidden" }))
}

#[catch(404)]
fn not_found() -> Json<Value> {
    Json(json!({ "success": false, "message": "not found" }))
}

#[catch(422)]
fn unprocessable() -> Json<Value> {
    Json(json!({ "success": false, "message": "malformed request body" }))
}

#[catch(500)]
fn server_error() -> Json<Value> {
    Json(json!({ "success": false, "message": "internal error" }))
}

/// Assemble the Rocket instance around an initialized pool. Split from the
/// launch function so tests can drive the full HTTP surface.
pub fn build_rocket(pool: DbPool) -> Rocket<Build> {
    rocket::build()
        .manage(pool)
        .mount("/api", routes::api::routes())
        .mount("/api", routes::admin_api::routes())
        .mount("/api/auth", routes::auth::routes())
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                unprocessable,
                server_error
            ],
        )
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    // Boot check — verify/create directories before anything touches disk
    boot::run();

    let pool = db::init_pool().expect("Failed to initialize database pool");
    db::run_migrations(&pool).expect("Failed to run database migrations");
    db::seed_defaults(&pool).expect("Failed to seed defaults");

    let _ = auth::cleanup_expired_sessions(&pool);

    build_rocket(pool)
}
