use async_trait::async_trait;

use crate::database::models::{Goal, Subgoal, Task, TaskList};
use crate::database::{Store, StoreError};
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// A row that belongs to exactly one user, directly or through its parent
#[async_trait]
pub trait Owned: Sized + Send {
    /// Human-readable resource name used in error messages
    const NAME: &'static str;

    async fn find(store: &dyn Store, id: i64) -> Result<Option<Self>, StoreError>;

    /// Owning user id, `None` when a parent in the chain is gone
    async fn owner_id(&self, store: &dyn Store) -> Result<Option<i64>, StoreError>;
}

/// Load `id` and check it belongs to `user`.
///
/// 404 when the row or any parent is missing or deleted, 403 when it belongs
/// to someone else.
pub async fn load_owned<R: Owned>(
    store: &dyn Store,
    id: i64,
    user: AuthUser,
) -> Result<R, ApiError> {
    let not_found = || ApiError::not_found(format!("No {} found with the provided ID", R::NAME));

    let resource = R::find(store, id).await?.ok_or_else(not_found)?;
    let owner = resource.owner_id(store).await?.ok_or_else(not_found)?;

    if owner != user.user_id {
        tracing::warn!(
            user_id = user.user_id,
            owner_id = owner,
            resource = R::NAME,
            id,
            "Ownership check failed"
        );
        return Err(ApiError::forbidden(format!(
            "You are not authorized to modify this {}",
            R::NAME
        )));
    }

    Ok(resource)
}

#[async_trait]
impl Owned for TaskList {
    const NAME: &'static str = "task list";

    async fn find(store: &dyn Store, id: i64) -> Result<Option<Self>, StoreError> {
        store.find_list(id).await
    }

    async fn owner_id(&self, _store: &dyn Store) -> Result<Option<i64>, StoreError> {
        Ok(Some(self.user_id))
    }
}

#[async_trait]
impl Owned for Task {
    const NAME: &'static str = "task";

    async fn find(store: &dyn Store, id: i64) -> Result<Option<Self>, StoreError> {
        store.find_task(id).await
    }

    async fn owner_id(&self, store: &dyn Store) -> Result<Option<i64>, StoreError> {
        Ok(store.find_list(self.task_list_id).await?.map(|list| list.user_id))
    }
}

#[async_trait]
impl Owned for Goal {
    const NAME: &'static str = "goal";

    async fn find(store: &dyn Store, id: i64) -> Result<Option<Self>, StoreError> {
        store.find_goal(id).await
    }

    async fn owner_id(&self, _store: &dyn Store) -> Result<Option<i64>, StoreError> {
        Ok(Some(self.user_id))
    }
}

#[async_trait]
impl Owned for Subgoal {
    const NAME: &'static str = "subgoal";

    async fn find(store: &dyn Store, id: i64) -> Result<Option<Self>, StoreError> {
        store.find_subgoal(id).await
    }

    async fn owner_id(&self, store: &dyn Store) -> Result<Option<i64>, StoreError> {
        Ok(store.find_goal(self.goal_id).await?.map(|goal| goal.user_id))
    }
}
