use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::tracker::HydrationTracker;
use chrono::NaiveDate;
use uuid::Uuid;

const TRACKER_COLUMNS: &str = "id, id_owner, weight_at_time, date, goal, missing, consumed, goal_percent, goal_reached";

#[async_trait::async_trait]
pub trait TrackerRepository {
    /// Inserts a new tracker. A second tracker for the same owner and date fails with `Conflict`.
    async fn create_tracker(&self, tracker: &HydrationTracker) -> Result<HydrationTracker, AppError>;
    async fn get_tracker_by_date(&self, owner_id: &Uuid, date: NaiveDate) -> Result<Option<HydrationTracker>, AppError>;
    /// The owner's tracker with the most recent date, if any.
    async fn get_latest_tracker(&self, owner_id: &Uuid) -> Result<Option<HydrationTracker>, AppError>;
    /// Atomically adds `quantity` ml to the tracker and stores the recomputed fields.
    async fn add_consumption(&self, tracker_id: &Uuid, quantity: f64) -> Result<Option<HydrationTracker>, AppError>;
    /// Trackers ordered by date, newest first.
    async fn list_trackers(&self, owner_id: &Uuid, limit: Option<i64>) -> Result<Vec<HydrationTracker>, AppError>;
}

#[async_trait::async_trait]
impl TrackerRepository for PostgresRepository {
    async fn create_tracker(&self, tracker: &HydrationTracker) -> Result<HydrationTracker, AppError> {
        let query = format!(
            r#"
            INSERT INTO trackers (id, id_owner, weight_at_time, date, goal, missing, consumed, goal_percent, goal_reached)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TRACKER_COLUMNS}
            "#
        );

        let created = self
            .retrying("create_tracker", || {
                sqlx::query_as::<_, HydrationTracker>(&query)
                    .bind(tracker.id)
                    .bind(tracker.id_owner)
                    .bind(tracker.weight_at_time)
                    .bind(tracker.date)
                    .bind(tracker.goal)
                    .bind(tracker.missing)
                    .bind(tracker.consumed)
                    .bind(tracker.goal_percent)
                    .bind(tracker.goal_reached)
                    .fetch_one(&self.pool)
            })
            .await?;

        Ok(created)
    }

    async fn get_tracker_by_date(&self, owner_id: &Uuid, date: NaiveDate) -> Result<Option<HydrationTracker>, AppError> {
        let query = format!("SELECT {TRACKER_COLUMNS} FROM trackers WHERE id_owner = $1 AND date = $2");

        let tracker = self
            .retrying("get_tracker_by_date", || {
                sqlx::query_as::<_, HydrationTracker>(&query)
                    .bind(owner_id)
                    .bind(date)
                    .fetch_optional(&self.pool)
            })
            .await?;

        Ok(tracker)
    }

    async fn get_latest_tracker(&self, owner_id: &Uuid) -> Result<Option<HydrationTracker>, AppError> {
        let query = format!("SELECT {TRACKER_COLUMNS} FROM trackers WHERE id_owner = $1 ORDER BY date DESC LIMIT 1");

        let tracker = self
            .retrying("get_latest_tracker", || {
                sqlx::query_as::<_, HydrationTracker>(&query).bind(owner_id).fetch_optional(&self.pool)
            })
            .await?;

        Ok(tracker)
    }

    async fn add_consumption(&self, tracker_id: &Uuid, quantity: f64) -> Result<Option<HydrationTracker>, AppError> {
        let select = format!("SELECT {TRACKER_COLUMNS} FROM trackers WHERE id = $1 FOR UPDATE");
        let update = format!(
            r#"
            UPDATE trackers
            SET consumed = $1, missing = $2, goal_percent = $3, goal_reached = $4
            WHERE id = $5
            RETURNING {TRACKER_COLUMNS}
            "#
        );

        let (select, update) = (select.as_str(), update.as_str());

        let tracker = self
            .retrying("add_consumption", || async move {
                let mut transaction = self.pool.begin().await?;

                let Some(mut tracker) = sqlx::query_as::<_, HydrationTracker>(select)
                    .bind(tracker_id)
                    .fetch_optional(&mut *transaction)
                    .await?
                else {
                    transaction.rollback().await?;
                    return Ok(None);
                };

                tracker.add_consumption(quantity);

                let updated = sqlx::query_as::<_, HydrationTracker>(update)
                    .bind(tracker.consumed)
                    .bind(tracker.missing)
                    .bind(tracker.goal_percent)
                    .bind(tracker.goal_reached)
                    .bind(tracker.id)
                    .fetch_one(&mut *transaction)
                    .await?;

                transaction.commit().await?;
                Ok(Some(updated))
            })
            .await?;

        Ok(tracker)
    }

    async fn list_trackers(&self, owner_id: &Uuid, limit: Option<i64>) -> Result<Vec<HydrationTracker>, AppError> {
        let query = format!("SELECT {TRACKER_COLUMNS} FROM trackers WHERE id_owner = $1 ORDER BY date DESC LIMIT $2");

        let trackers = self
            .retrying("list_trackers", || {
                sqlx::query_as::<_, HydrationTracker>(&query)
                    .bind(owner_id)
                    .bind(limit)
                    .fetch_all(&self.pool)
            })
            .await?;

        Ok(trackers)
    }
}
