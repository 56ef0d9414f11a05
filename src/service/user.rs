use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::pagination::PaginationParams;
use crate::models::user::{User, UserRequest, UserUpdateRequest};
use uuid::Uuid;
use validator::Validate;

/// Parses a path identifier, reporting malformed ids as a bad request.
pub fn parse_user_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|e| AppError::uuid("Invalid user ID format", e))
}

pub struct UserService<'a, R: ?Sized> {
    repository: &'a R,
}

impl<'a, R> UserService<'a, R>
where
    R: UserRepository + Sync + ?Sized,
{
    pub fn new(repository: &'a R) -> Self {
        UserService { repository }
    }

    pub async fn create_user(&self, request: &UserRequest) -> Result<User, AppError> {
        request.validate()?;

        let user = self.repository.create_user(request).await?;
        tracing::info!(user_id = %user.id, name = %user.name, "created user");
        Ok(user)
    }

    pub async fn get_user(&self, id: &Uuid) -> Result<User, AppError> {
        match self.repository.get_user_by_id(id).await? {
            Some(user) => Ok(user),
            None => {
                tracing::warn!(user_id = %id, "user not found");
                Err(AppError::UserNotFound)
            }
        }
    }

    pub async fn update_user(&self, id: &Uuid, request: &UserUpdateRequest) -> Result<User, AppError> {
        if request.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }
        request.validate()?;

        let user = self.repository.update_user(id, request).await?.ok_or(AppError::UserNotFound)?;
        tracing::info!(user_id = %id, fields = ?request.changed_fields(), "updated user");
        Ok(user)
    }

    pub async fn delete_user(&self, id: &Uuid) -> Result<(), AppError> {
        if !self.repository.delete_user(id).await? {
            return Err(AppError::UserNotFound);
        }
        tracing::info!(user_id = %id, "deleted user and trackers");
        Ok(())
    }

    pub async fn list_users(&self, name: Option<&str>, pagination: &PaginationParams) -> Result<Vec<User>, AppError> {
        self.repository.list_users(name, pagination).await
    }
}
