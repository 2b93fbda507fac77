//! Administrative user changes.

use crate::{errors::*, types::*};
use gatehouse_storage::Storage;
use tracing::info;
use uuid::Uuid;

use super::UserService;

impl<S: Storage + 'static> UserService<S> {
    pub(crate) async fn set_permissions_internal(
        &self,
        user_id: Uuid,
        is_admin: bool,
        permissions: Permissions,
    ) -> Result<User> {
        let now = current_timestamp();
        let user = self
            .update_user(user_id, |user| {
                user.is_admin = is_admin;
                user.permissions = permissions.clone();
                user.updated_at = now;
            })
            .await?;

        info!(user_id = %user_id, is_admin, "User permissions updated");
        Ok(user)
    }
}
