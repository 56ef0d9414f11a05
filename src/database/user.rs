use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::pagination::PaginationParams;
use crate::models::user::{User, UserRequest, UserUpdateRequest};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait UserRepository {
    async fn create_user(&self, request: &UserRequest) -> Result<User, AppError>;
    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError>;
    /// Returns `None` when no user has this id.
    async fn update_user(&self, id: &Uuid, request: &UserUpdateRequest) -> Result<Option<User>, AppError>;
    /// Deletes the user together with every tracker it owns. Returns `false` when no user has this id.
    async fn delete_user(&self, id: &Uuid) -> Result<bool, AppError>;
    async fn list_users(&self, name: Option<&str>, pagination: &PaginationParams) -> Result<Vec<User>, AppError>;
}

/// Escapes LIKE metacharacters so the filter matches literally.
pub(crate) fn like_pattern(filter: &str) -> String {
    let mut escaped = String::with_capacity(filter.len() + 2);
    escaped.push('%');
    for c in filter.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait::async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self, request: &UserRequest) -> Result<User, AppError> {
        let user = self
            .retrying("create_user", || {
                sqlx::query_as::<_, User>(
                    r#"
                    INSERT INTO users (name, weight)
                    VALUES ($1, $2)
                    RETURNING id, name, weight
                    "#,
                )
                .bind(&request.name)
                .bind(request.weight)
                .fetch_one(&self.pool)
            })
            .await?;

        Ok(user)
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let user = self
            .retrying("get_user_by_id", || {
                sqlx::query_as::<_, User>(
                    r#"
                    SELECT id, name, weight
                    FROM users
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .fetch_optional(&self.pool)
            })
            .await?;

        Ok(user)
    }

    async fn update_user(&self, id: &Uuid, request: &UserUpdateRequest) -> Result<Option<User>, AppError> {
        let user = self
            .retrying("update_user", || {
                sqlx::query_as::<_, User>(
                    r#"
                    UPDATE users
                    SET name = COALESCE($1, name), weight = COALESCE($2, weight)
                    WHERE id = $3
                    RETURNING id, name, weight
                    "#,
                )
                .bind(&request.name)
                .bind(request.weight)
                .bind(id)
                .fetch_optional(&self.pool)
            })
            .await?;

        Ok(user)
    }

    async fn delete_user(&self, id: &Uuid) -> Result<bool, AppError> {
        let deleted = self
            .retrying("delete_user", || async move {
                let mut transaction = self.pool.begin().await?;

                sqlx::query("DELETE FROM trackers WHERE id_owner = $1")
                    .bind(id)
                    .execute(&mut *transaction)
                    .await?;

                let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&mut *transaction).await?;

                transaction.commit().await?;
                Ok(result.rows_affected() > 0)
            })
            .await?;

        Ok(deleted)
    }

    async fn list_users(&self, name: Option<&str>, pagination: &PaginationParams) -> Result<Vec<User>, AppError> {
        let pattern = name.filter(|n| !n.is_empty()).map(like_pattern);

        let users = self
            .retrying("list_users", || {
                sqlx::query_as::<_, User>(
                    r#"
                    SELECT id, name, weight
                    FROM users
                    WHERE $1::text IS NULL OR name ILIKE $1
                    ORDER BY name, id
                    OFFSET $2
                    LIMIT $3
                    "#,
                )
                .bind(pattern.as_deref())
                .bind(pagination.offset())
                .bind(pagination.effective_limit())
                .fetch_all(&self.pool)
            })
            .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("ana"), "%ana%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
