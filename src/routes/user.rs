use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::middleware::rate_limit::RateLimit;
use crate::models::pagination::PaginationParams;
use crate::models::user::{User, UserRequest, UserUpdateRequest};
use crate::service::user::{UserService, parse_user_id};
use rocket::http::Status;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post, put};
use rocket_okapi::openapi;

/// Create a user
#[openapi(tag = "Users")]
#[post("/user", data = "<payload>")]
pub async fn create_user(repo: &State<PostgresRepository>, _rate_limit: RateLimit, payload: JsonBody<UserRequest>) -> Result<Created<Json<User>>, AppError> {
    let user = UserService::new(repo.inner()).create_user(&payload).await?;
    Ok(Created::new(format!("/user/{}", user.id)).body(Json(user)))
}

/// Get a user by ID
#[openapi(tag = "Users")]
#[get("/user/<id>")]
pub async fn get_user(repo: &State<PostgresRepository>, _rate_limit: RateLimit, id: &str) -> Result<Json<User>, AppError> {
    let user_id = parse_user_id(id)?;
    Ok(Json(UserService::new(repo.inner()).get_user(&user_id).await?))
}

/// Update a user's name and/or weight
#[openapi(tag = "Users")]
#[put("/user/<id>", data = "<payload>")]
pub async fn update_user(
    repo: &State<PostgresRepository>,
    _rate_limit: RateLimit,
    id: &str,
    payload: JsonBody<UserUpdateRequest>,
) -> Result<Json<User>, AppError> {
    let user_id = parse_user_id(id)?;
    Ok(Json(UserService::new(repo.inner()).update_user(&user_id, &payload).await?))
}

/// Delete a user together with all of their trackers
#[openapi(tag = "Users")]
#[delete("/user/<id>")]
pub async fn delete_user(repo: &State<PostgresRepository>, _rate_limit: RateLimit, id: &str) -> Result<Status, AppError> {
    let user_id = parse_user_id(id)?;
    UserService::new(repo.inner()).delete_user(&user_id).await?;
    Ok(Status::NoContent)
}

/// List users, optionally filtered by a case-insensitive name fragment
#[openapi(tag = "Users")]
#[get("/users?<name>&<skip>&<limit>")]
pub async fn list_users(
    repo: &State<PostgresRepository>,
    _rate_limit: RateLimit,
    name: Option<String>,
    skip: Option<i64>,
    limit: Option<i64>,
) -> Result<Json<Vec<User>>, AppError> {
    let pagination = PaginationParams::new(skip, limit)?;
    let users = UserService::new(repo.inner()).list_users(name.as_deref(), &pagination).await?;
    Ok(Json(users))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![create_user, get_user, update_user, delete_user, list_users]
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{database_client, lazy_client};
    use rocket::http::{ContentType, Status};
    use serde_json::{Value, json};

    #[rocket::async_test]
    async fn malformed_id_is_bad_request() {
        let client = lazy_client().await;

        for uri in ["/user/not-a-uuid", "/user/not-a-uuid/"] {
            let response = client.get(uri).dispatch().await;
            assert_eq!(response.status(), Status::BadRequest);
            let body: Value = response.into_json().await.expect("json body");
            assert_eq!(body["message"], "Invalid user ID format");
        }

        let response = client.delete("/user/1234").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn malformed_body_is_unprocessable() {
        let client = lazy_client().await;

        let response = client.post("/user").header(ContentType::JSON).body(r#"{"name": "Ana"}"#).dispatch().await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
        let body: Value = response.into_json().await.expect("json body");
        assert_eq!(body["errors"][0]["category"], "data");
    }

    #[rocket::async_test]
    async fn negative_pagination_is_bad_request() {
        let client = lazy_client().await;
        let response = client.get("/users?skip=-1").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    #[ignore = "requires database"]
    async fn user_lifecycle() {
        let client = database_client().await;

        let response = client
            .post("/user")
            .header(ContentType::JSON)
            .body(json!({"name": "Lifecycle", "weight": 70.0}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        let user: Value = response.into_json().await.expect("json body");
        let id = user["id"].as_str().expect("id").to_string();

        let response = client
            .put(format!("/user/{id}"))
            .header(ContentType::JSON)
            .body(r#"{"weight": 72.5}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let updated: Value = response.into_json().await.expect("json body");
        assert_eq!(updated["name"], "Lifecycle");
        assert_eq!(updated["weight"], 72.5);

        let response = client.put(format!("/user/{id}")).header(ContentType::JSON).body("{}").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client.get("/users?name=lifecyc").dispatch().await;
        let users: Vec<Value> = response.into_json().await.expect("json body");
        assert!(users.iter().any(|u| u["id"] == id.as_str()));

        assert_eq!(client.delete(format!("/user/{id}")).dispatch().await.status(), Status::NoContent);
        assert_eq!(client.get(format!("/user/{id}")).dispatch().await.status(), Status::NotFound);
    }
}
