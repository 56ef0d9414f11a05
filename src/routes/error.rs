use crate::error::json::BodyError;
use crate::middleware::rate_limit::rejected_retry_after;
use rocket::Either;
use rocket::http::{Header, Status};
use rocket::response::{self, Responder, Response};
use rocket::serde::Serialize;
use rocket::serde::json::Json;
use rocket::{Request, catch};

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Error {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BodyError>,
}

impl Error {
    fn new(message: &str) -> Json<Self> {
        Json(Error {
            message: message.to_string(),
            errors: Vec::new(),
        })
    }
}

/// JSON body plus a `Retry-After` header.
pub struct TooManyRequests {
    retry_after: u64,
    body: Json<Error>,
}

impl<'r> Responder<'r, 'static> for TooManyRequests {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        Response::build_from(self.body.respond_to(req)?)
            .status(Status::TooManyRequests)
            .header(Header::new("Retry-After", self.retry_after.to_string()))
            .ok()
    }
}

#[catch(400)]
pub fn bad_request(_: &Request) -> Json<Error> {
    Error::new("Bad request")
}

/// Requests matching no route are still subject to the rate limiter.
#[catch(404)]
pub fn not_found(req: &Request) -> Either<TooManyRequests, Json<Error>> {
    match rejected_retry_after(req) {
        Some(retry_after) => Either::Left(rate_limit_exceeded(retry_after)),
        None => Either::Right(Error::new("Not found")),
    }
}

#[catch(409)]
pub fn conflict(_: &Request) -> Json<Error> {
    Error::new("Conflict")
}

#[catch(422)]
pub fn unprocessable_entity(req: &Request) -> Json<Error> {
    let errors = req.local_cache(|| None::<BodyError>).iter().cloned().collect();
    Json(Error {
        message: "Request body could not be processed".to_string(),
        errors,
    })
}

fn rate_limit_exceeded(retry_after: u64) -> TooManyRequests {
    TooManyRequests {
        retry_after,
        body: Error::new("Rate limit exceeded. Please try again later."),
    }
}

#[catch(429)]
pub fn too_many_requests(req: &Request) -> TooManyRequests {
    rate_limit_exceeded(rejected_retry_after(req).unwrap_or(60))
}

#[catch(500)]
pub fn internal_error(_: &Request) -> Json<Error> {
    Error::new("Internal server error")
}
