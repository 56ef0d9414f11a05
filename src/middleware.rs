pub mod rate_limit;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::request::Request;
use rocket::{Data, Response};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Correlation id stored in the request cache and echoed as `X-Request-Id`.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
struct RequestStart(Instant);

/// Fairing that tags each request with an id and logs it on the way in and out.
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let request_id = RequestId::new();

        request.local_cache(|| Some(request_id.clone()));
        request.local_cache(|| Some(RequestStart(Instant::now())));

        info!(
            request_id = %request_id.0,
            client = %rate_limit::client_id(request),
            method = %request.method(),
            uri = %request.uri(),
            "incoming request"
        );
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let request_id = request
            .local_cache(|| None::<RequestId>)
            .as_ref()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let elapsed_ms = request
            .local_cache(|| None::<RequestStart>)
            .map(|start| start.0.elapsed().as_millis())
            .unwrap_or_default();

        let status = response.status();

        response.set_header(Header::new("X-Request-Id", request_id.clone()));
        response.set_header(Header::new("X-Content-Type-Options", "nosniff"));

        if status.class().is_server_error() || status.class().is_client_error() {
            warn!(
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                status = %status.code,
                elapsed_ms,
                "request completed with error"
            );
        } else {
            info!(
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                status = %status.code,
                elapsed_ms,
                "request completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::Status;
    use rocket::local::asynchronous::Client;
    use rocket::{get, routes};

    #[get("/ping")]
    fn ping() -> &'static str {
        "pong"
    }

    #[test]
    fn request_ids_are_unique_uuids() {
        let id1 = RequestId::new();
        let id2 = RequestId::default();
        assert!(Uuid::parse_str(&id1.0).is_ok());
        assert_ne!(id1.0, id2.0);
    }

    #[rocket::async_test]
    async fn responses_carry_request_id() {
        let rocket = rocket::build().attach(RequestLogger).mount("/", routes![ping]);
        let client = Client::tracked(rocket).await.expect("valid rocket instance");

        let response = client.get("/ping").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let request_id = response.headers().get_one("X-Request-Id").expect("request id header");
        assert!(Uuid::parse_str(request_id).is_ok());

        let missing = client.get("/nowhere").dispatch().await;
        assert_eq!(missing.status(), Status::NotFound);
        assert!(missing.headers().get_one("X-Request-Id").is_some());
    }
}
