use std::sync::Arc;

use uuid::Uuid;

use crate::{
    bus::EventBus,
    entities::user::{Principal, User, UserProfileResponse},
    errors::AppError,
    events::{UserDeleted, USER_DELETED_TOPIC},
    repositories::user::UserRepository,
};

pub struct UserHandler<R>
where
    R: UserRepository,
{
    pub user_repo: R,
    pub bus: Arc<dyn EventBus>,
}

impl<R> UserHandler<R>
where
    R: UserRepository,
{
    pub fn new(user_repo: R, bus: Arc<dyn EventBus>) -> Self {
        UserHandler { user_repo, bus }
    }

    pub async fn get_user(&self, id: &Uuid) -> Result<UserProfileResponse, AppError> {
        let user = self
            .user_repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with id: {}", id)))?;

        Ok(UserProfileResponse::from(user))
    }

    pub async fn save_user(&self, user: &User) -> Result<(), AppError> {
        self.user_repo.save(user).await
    }

    /// Deletes the caller's own account and publishes `user.deleted`. The
    /// local delete is authoritative; a publish failure is logged and
    /// swallowed so bus availability never blocks the user-visible deletion.
    /// The cascade then converges via redelivery or the reconciler.
    pub async fn delete_user(&self, user_id: Uuid, principal: &Principal) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find(&user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with id: {}", user_id)))?;

        if user.id != principal.id {
            return Err(AppError::Forbidden(
                "You do not have permission to delete this user".into(),
            ));
        }

        self.user_repo.delete(&user_id).await?;

        let event = UserDeleted { id: user_id };
        match event.to_payload() {
            Ok(payload) => {
                if let Err(e) = self
                    .bus
                    .publish(USER_DELETED_TOPIC, &user_id.to_string(), &payload)
                    .await
                {
                    tracing::error!(
                        "Failed to publish user.deleted for {}: {}. Cleanup deferred to consumers/reconciler.",
                        user_id, e
                    );
                }
            }
            Err(e) => tracing::error!("Failed to encode user.deleted for {}: {}", user_id, e),
        }

        Ok(())
    }
}
