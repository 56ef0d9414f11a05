mod config;
mod database;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod service;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;

use crate::db::stage_db;
use crate::middleware::RequestLogger;
use crate::middleware::rate_limit::RateLimiter;
use crate::routes as app_routes;
use rocket::figment::Figment;
use rocket::{Build, Rocket, catchers, http::Method};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};
use rocket_okapi::{get_openapi_route, okapi::merge::marge_spec_list};
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: &str, json_format: bool) {
    // RUST_LOG takes precedence over the configured level, e.g.
    //   RUST_LOG=hydration_tracker::service=debug,info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    // A subscriber may already be installed (tests build several instances).
    let _ = if json_format { subscriber.json().try_init() } else { subscriber.try_init() };
}

fn build_cors(cors_config: &config::CorsConfig) -> CorsOptions {
    let is_wildcard = cors_config.allowed_origins.len() == 1 && cors_config.allowed_origins[0] == "*";

    if is_wildcard && cors_config.allow_credentials {
        panic!(
            "Invalid CORS configuration: Cannot use wildcard origins (*) with credentials enabled. \
            Either set specific origins or disable credentials."
        );
    }

    let allowed_origins = if cors_config.allowed_origins.is_empty() {
        AllowedOrigins::some_exact::<&str>(&[])
    } else if is_wildcard {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&cors_config.allowed_origins.iter().map(String::as_str).collect::<Vec<_>>())
    };

    CorsOptions {
        allowed_origins,
        allowed_methods: vec![Method::Get, Method::Post, Method::Put, Method::Delete, Method::Options, Method::Head]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: rocket_cors::AllowedHeaders::all(),
        allow_credentials: cors_config.allow_credentials,
        ..Default::default()
    }
}

/// Rocket's own settings (bind address, port and optional TLS) layered on its default figment.
fn rocket_figment(config: &Config) -> Figment {
    let figment = rocket::Config::figment()
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port));

    match config.tls.paths() {
        Some((certs, key)) => {
            tracing::info!(certs, key, "TLS enabled");
            figment.merge(("tls.certs", certs)).merge(("tls.key", key))
        }
        None => figment,
    }
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return config::DEFAULT_API_BASE_PATH.to_string();
    }

    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };

    while normalized.ends_with('/') && normalized.len() > 1 {
        normalized.pop();
    }

    normalized
}

pub(crate) fn join_base_path(base_path: &str, path: &str) -> String {
    let base = base_path.trim_end_matches('/');
    let suffix = path.trim_start_matches('/');

    if base.is_empty() {
        format!("/{}", suffix)
    } else if suffix.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, suffix)
    }
}

struct RouteSpec {
    path: &'static str,
    routes: Vec<rocket::Route>,
    openapi: rocket_okapi::okapi::openapi3::OpenApi,
}

fn collect_route_specs() -> Vec<RouteSpec> {
    let (health_routes, health_openapi) = app_routes::health::routes();
    let (user_routes, user_openapi) = app_routes::user::routes();
    let (tracker_routes, tracker_openapi) = app_routes::tracker::routes();

    vec![
        RouteSpec {
            path: "",
            routes: health_routes,
            openapi: health_openapi,
        },
        RouteSpec {
            path: "",
            routes: user_routes,
            openapi: user_openapi,
        },
        RouteSpec {
            path: "",
            routes: tracker_routes,
            openapi: tracker_openapi,
        },
    ]
}

fn mount_api_routes(mut rocket: Rocket<Build>, base_path: &str, enable_swagger: bool) -> Rocket<Build> {
    let route_specs = collect_route_specs();

    if enable_swagger {
        let mut openapi_list = Vec::new();
        for spec in route_specs {
            rocket = rocket.mount(join_base_path(base_path, spec.path), spec.routes);
            openapi_list.push((spec.path, spec.openapi));
        }

        let openapi_docs = match marge_spec_list(&openapi_list) {
            Ok(docs) => docs,
            Err(err) => panic!("Could not merge OpenAPI spec: {}", err),
        };

        let settings = rocket_okapi::settings::OpenApiSettings::default();
        rocket = rocket.mount(base_path, vec![get_openapi_route(openapi_docs, &settings)]);

        let docs_path = join_base_path(base_path, "docs");
        let openapi_url = join_base_path(base_path, "openapi.json");
        rocket = rocket.mount(
            docs_path,
            make_swagger_ui(&SwaggerUIConfig {
                url: openapi_url,
                ..Default::default()
            }),
        );
    } else {
        for spec in route_specs {
            rocket = rocket.mount(join_base_path(base_path, spec.path), spec.routes);
        }
    }

    rocket
}

fn stage_rate_limiter(rate_limit_config: config::RateLimitConfig, base_path: &str) -> RateLimiter {
    if rate_limit_config.enabled {
        tracing::info!(
            requests_per_minute = rate_limit_config.requests_per_minute,
            window_seconds = rate_limit_config.window_seconds,
            "rate limiting enabled"
        );
    } else {
        tracing::info!("rate limiting disabled");
    }
    RateLimiter::new(rate_limit_config, base_path)
}

/// Everything except the store: routes, catchers and the request-level fairings.
pub(crate) fn assemble_rocket(config: &Config) -> Rocket<Build> {
    let cors = build_cors(&config.cors).to_cors().expect("Failed to create CORS fairing");
    let base_path = normalize_base_path(&config.api.base_path);

    // Request fairings run in attach order; the limiter logs the request id.
    let mut rocket = rocket::custom(rocket_figment(config))
        .attach(cors)
        .attach(RequestLogger)
        .attach(stage_rate_limiter(config.rate_limit.clone(), &base_path));

    rocket = mount_api_routes(rocket, &base_path, config.api.enable_swagger);

    rocket.register(
        base_path.as_str(),
        catchers![
            app_routes::error::bad_request,
            app_routes::error::not_found,
            app_routes::error::conflict,
            app_routes::error::unprocessable_entity,
            app_routes::error::too_many_requests,
            app_routes::error::internal_error
        ],
    )
}

pub fn build_rocket(config: Config) -> Rocket<Build> {
    init_tracing(&config.logging.effective_level(), config.logging.json_format);

    assemble_rocket(&config).attach(stage_db(config.database))
}
