use crate::db::{RetryPolicy, with_retry};
use sqlx::PgPool;
use std::future::Future;

/// Store access shared by every request: one pool plus the retry policy wrapped around each call.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pub pool: PgPool,
    pub retry: RetryPolicy,
}

impl PostgresRepository {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    pub(crate) async fn retrying<T, F, Fut>(&self, operation_name: &str, operation: F) -> Result<T, sqlx::Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        with_retry(&self.retry, operation_name, operation).await
    }
}
