use crate::middleware::rate_limit::RateLimit;
use rocket::serde::json::{Json, Value, json};
use rocket::{get, http::Status};
use rocket_okapi::openapi;

/// Greeting at the service root
#[openapi(tag = "Health")]
#[get("/")]
pub async fn hello(_rate_limit: RateLimit) -> Json<Value> {
    Json(json!({ "Hello": "World" }))
}

/// Liveness check
#[openapi(tag = "Health")]
#[get("/health")]
pub async fn healthcheck(_rate_limit: RateLimit) -> Status {
    Status::Ok
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![hello, healthcheck]
}
