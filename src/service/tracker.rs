use crate::database::tracker::TrackerRepository;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::tracker::HydrationTracker;
use crate::models::user::User;
use chrono::NaiveDate;
use uuid::Uuid;

/// Parses a `YYYY-MM-DD` path segment.
pub fn parse_tracker_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| AppError::InvalidDate(format!("'{raw}' is not a YYYY-MM-DD date")))
}

/// The server's current calendar day.
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Daily tracker lifecycle: lazy creation, goal computation and consumption accrual.
///
/// `today` is injected so the lifecycle does not depend on the wall clock.
pub struct TrackerService<'a, R: ?Sized> {
    repository: &'a R,
    today: NaiveDate,
}

impl<'a, R> TrackerService<'a, R>
where
    R: UserRepository + TrackerRepository + Sync + ?Sized,
{
    pub fn new(repository: &'a R, today: NaiveDate) -> Self {
        TrackerService { repository, today }
    }

    async fn owner(&self, user_id: &Uuid) -> Result<User, AppError> {
        self.repository.get_user_by_id(user_id).await?.ok_or(AppError::UserNotFound)
    }

    pub async fn create_tracker(&self, user_id: &Uuid, date: NaiveDate) -> Result<HydrationTracker, AppError> {
        let owner = self.owner(user_id).await?;

        if date > self.today {
            return Err(AppError::InvalidInput("Cannot create tracker for future date".to_string()));
        }

        if self.repository.get_tracker_by_date(user_id, date).await?.is_some() {
            return Err(AppError::Conflict("Tracker already exists".to_string()));
        }

        let tracker = self.repository.create_tracker(&HydrationTracker::new_for(&owner, date)).await?;
        tracing::info!(user_id = %user_id, date = %date, goal = tracker.goal, "created tracker");
        Ok(tracker)
    }

    /// Returns today's tracker, creating it when the newest one is older than today.
    ///
    /// A concurrent request may create the same tracker between the read and
    /// the insert; that tracker is returned instead of a conflict.
    pub async fn today_tracker(&self, user_id: &Uuid) -> Result<HydrationTracker, AppError> {
        self.owner(user_id).await?;

        if let Some(latest) = self.repository.get_latest_tracker(user_id).await?.filter(|t| t.date >= self.today) {
            return Ok(latest);
        }

        match self.create_tracker(user_id, self.today).await {
            Err(AppError::Conflict(_)) => {
                tracing::debug!(user_id = %user_id, date = %self.today, "tracker created concurrently, re-reading");
                self.repository
                    .get_tracker_by_date(user_id, self.today)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("No tracker found for date {}", self.today)))
            }
            result => result,
        }
    }

    pub async fn get_tracker(&self, user_id: &Uuid, date: NaiveDate) -> Result<HydrationTracker, AppError> {
        self.owner(user_id).await?;

        self.repository
            .get_tracker_by_date(user_id, date)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No tracker found for date {date}")))
    }

    pub async fn add_consumption(&self, user_id: &Uuid, date: NaiveDate, cupsize: f64) -> Result<HydrationTracker, AppError> {
        if !(cupsize > 0.0) || !cupsize.is_finite() {
            return Err(AppError::InvalidQuantity("Cup size must be positive".to_string()));
        }

        let tracker = self.get_tracker(user_id, date).await?;

        let updated = self
            .repository
            .add_consumption(&tracker.id, cupsize)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No tracker found for date {date}")))?;

        tracing::info!(user_id = %user_id, date = %date, cupsize, consumed = updated.consumed, "updated tracker consumption");
        Ok(updated)
    }

    pub async fn list_history(&self, user_id: &Uuid, limit: Option<i64>) -> Result<Vec<HydrationTracker>, AppError> {
        self.owner(user_id).await?;

        let limit = match limit {
            Some(limit) if limit < 0 => return Err(AppError::BadRequest("limit must not be negative".to_string())),
            Some(0) | None => None,
            Some(limit) => Some(limit),
        };

        let trackers = self.repository.list_trackers(user_id, limit).await?;
        tracing::info!(user_id = %user_id, count = trackers.len(), "retrieved tracker history");
        Ok(trackers)
    }
}
