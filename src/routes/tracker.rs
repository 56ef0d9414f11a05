use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::middleware::rate_limit::RateLimit;
use crate::models::tracker::{ConsumptionRequest, HydrationTracker};
use crate::service::tracker::{TrackerService, local_today, parse_tracker_date};
use crate::service::user::parse_user_id;
use rocket::serde::json::Json;
use rocket::{State, get, post, put};
use rocket_okapi::openapi;

fn service(repo: &State<PostgresRepository>) -> TrackerService<'_, PostgresRepository> {
    TrackerService::new(repo.inner(), local_today())
}

/// Get today's tracker, creating it if the user has none for today yet
#[openapi(tag = "Trackers")]
#[get("/user/<id>/tracker")]
pub async fn get_today_tracker(repo: &State<PostgresRepository>, _rate_limit: RateLimit, id: &str) -> Result<Json<HydrationTracker>, AppError> {
    let user_id = parse_user_id(id)?;
    Ok(Json(service(repo).today_tracker(&user_id).await?))
}

/// Get the tracker for a specific date
#[openapi(tag = "Trackers")]
#[get("/user/<id>/tracker/<date>")]
pub async fn get_tracker(repo: &State<PostgresRepository>, _rate_limit: RateLimit, id: &str, date: &str) -> Result<Json<HydrationTracker>, AppError> {
    let user_id = parse_user_id(id)?;
    let date = parse_tracker_date(date)?;
    Ok(Json(service(repo).get_tracker(&user_id, date).await?))
}

/// Create the tracker for a specific (non-future) date
#[openapi(tag = "Trackers")]
#[post("/user/<id>/tracker/<date>")]
pub async fn create_tracker(repo: &State<PostgresRepository>, _rate_limit: RateLimit, id: &str, date: &str) -> Result<Json<HydrationTracker>, AppError> {
    let user_id = parse_user_id(id)?;
    let date = parse_tracker_date(date)?;
    Ok(Json(service(repo).create_tracker(&user_id, date).await?))
}

/// Add a cup of water (in ml) to the tracker for a specific date
#[openapi(tag = "Trackers")]
#[put("/user/<id>/tracker/<date>", data = "<payload>")]
pub async fn add_consumption(
    repo: &State<PostgresRepository>,
    _rate_limit: RateLimit,
    id: &str,
    date: &str,
    payload: JsonBody<ConsumptionRequest>,
) -> Result<Json<HydrationTracker>, AppError> {
    let user_id = parse_user_id(id)?;
    let date = parse_tracker_date(date)?;
    Ok(Json(service(repo).add_consumption(&user_id, date, payload.cupsize).await?))
}

/// List a user's trackers, newest first. A zero or missing limit returns all of them.
#[openapi(tag = "Trackers")]
#[get("/user/<id>/history?<limit>")]
pub async fn get_history(
    repo: &State<PostgresRepository>,
    _rate_limit: RateLimit,
    id: &str,
    limit: Option<i64>,
) -> Result<Json<Vec<HydrationTracker>>, AppError> {
    let user_id = parse_user_id(id)?;
    Ok(Json(service(repo).list_history(&user_id, limit).await?))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![get_today_tracker, get_tracker, create_tracker, add_consumption, get_history]
}
