use crate::database::tracker::TrackerRepository;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::pagination::PaginationParams;
use crate::models::tracker::HydrationTracker;
use crate::models::user::{User, UserRequest, UserUpdateRequest};
use crate::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::db::RetryPolicy;
use chrono::NaiveDate;
use rocket::local::asynchronous::Client;
use sqlx::postgres::PgPoolOptions;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// Client for routes that fail before touching the store. The pool never connects.
pub async fn lazy_client() -> Client {
    lazy_client_with(Config::default()).await
}

pub async fn lazy_client_with(config: Config) -> Client {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy(&config.database.url)
        .expect("valid database url");
    let repository = PostgresRepository::new(
        pool,
        RetryPolicy {
            max_attempts: 1,
            delay: Duration::ZERO,
        },
    );

    Client::tracked(crate::assemble_rocket(&config).manage(repository))
        .await
        .expect("valid rocket instance")
}

/// Client backed by the database named in `DATABASE_URL`.
pub async fn database_client() -> Client {
    let mut config = Config::default();
    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database.url = url;
    }
    config.rate_limit.enabled = false;

    Client::tracked(crate::build_rocket(config)).await.expect("valid rocket instance")
}

impl From<&UserRequest> for User {
    fn from(request: &UserRequest) -> Self {
        User {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            weight: request.weight,
        }
    }
}

#[derive(Default)]
struct Store {
    users: Vec<User>,
    trackers: Vec<HydrationTracker>,
}

/// In-memory stand-in for the Postgres store, honouring the same uniqueness and ordering rules.
#[derive(Default)]
pub struct MockRepository {
    store: Mutex<Store>,
}

impl MockRepository {
    pub fn insert_user(&self, name: &str, weight: f64) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            weight,
        };
        self.store.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn set_weight(&self, id: &Uuid, weight: f64) {
        let mut store = self.store.lock().unwrap();
        if let Some(user) = store.users.iter_mut().find(|u| u.id == *id) {
            user.weight = weight;
        }
    }

    pub fn tracker_count(&self) -> usize {
        self.store.lock().unwrap().trackers.len()
    }
}

#[async_trait::async_trait]
impl UserRepository for MockRepository {
    async fn create_user(&self, request: &UserRequest) -> Result<User, AppError> {
        let user: User = request.into();
        self.store.lock().unwrap().users.push(user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        Ok(self.store.lock().unwrap().users.iter().find(|u| u.id == *id).cloned())
    }

    async fn update_user(&self, id: &Uuid, request: &UserUpdateRequest) -> Result<Option<User>, AppError> {
        let mut store = self.store.lock().unwrap();
        let Some(user) = store.users.iter_mut().find(|u| u.id == *id) else {
            return Ok(None);
        };
        if let Some(name) = &request.name {
            user.name = name.clone();
        }
        if let Some(weight) = request.weight {
            user.weight = weight;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: &Uuid) -> Result<bool, AppError> {
        let mut store = self.store.lock().unwrap();
        store.trackers.retain(|t| t.id_owner != *id);
        let before = store.users.len();
        store.users.retain(|u| u.id != *id);
        Ok(store.users.len() < before)
    }

    async fn list_users(&self, name: Option<&str>, pagination: &PaginationParams) -> Result<Vec<User>, AppError> {
        let needle = name.map(str::to_lowercase);
        let mut users: Vec<User> = self
            .store
            .lock()
            .unwrap()
            .users
            .iter()
            .filter(|u| needle.as_deref().is_none_or(|n| u.name.to_lowercase().contains(n)))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        let window = users.into_iter().skip(pagination.offset() as usize);
        Ok(match pagination.effective_limit() {
            Some(limit) => window.take(limit as usize).collect(),
            None => window.collect(),
        })
    }
}

#[async_trait::async_trait]
impl TrackerRepository for MockRepository {
    async fn create_tracker(&self, tracker: &HydrationTracker) -> Result<HydrationTracker, AppError> {
        let mut store = self.store.lock().unwrap();
        if store.trackers.iter().any(|t| t.id_owner == tracker.id_owner && t.date == tracker.date) {
            return Err(AppError::Conflict("Tracker already exists".to_string()));
        }
        store.trackers.push(tracker.clone());
        Ok(tracker.clone())
    }

    async fn get_tracker_by_date(&self, owner_id: &Uuid, date: NaiveDate) -> Result<Option<HydrationTracker>, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store.trackers.iter().find(|t| t.id_owner == *owner_id && t.date == date).cloned())
    }

    async fn get_latest_tracker(&self, owner_id: &Uuid) -> Result<Option<HydrationTracker>, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store.trackers.iter().filter(|t| t.id_owner == *owner_id).max_by_key(|t| t.date).cloned())
    }

    async fn add_consumption(&self, tracker_id: &Uuid, quantity: f64) -> Result<Option<HydrationTracker>, AppError> {
        let mut store = self.store.lock().unwrap();
        let Some(tracker) = store.trackers.iter_mut().find(|t| t.id == *tracker_id) else {
            return Ok(None);
        };
        tracker.add_consumption(quantity);
        Ok(Some(tracker.clone()))
    }

    async fn list_trackers(&self, owner_id: &Uuid, limit: Option<i64>) -> Result<Vec<HydrationTracker>, AppError> {
        let store = self.store.lock().unwrap();
        let mut trackers: Vec<HydrationTracker> = store.trackers.iter().filter(|t| t.id_owner == *owner_id).cloned().collect();
        trackers.sort_by(|a, b| b.date.cmp(&a.date));
        if let Some(limit) = limit {
            trackers.truncate(limit.max(0) as usize);
        }
        Ok(trackers)
    }
}
