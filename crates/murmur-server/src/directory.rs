//! User directory operations: registration, lookup, profile and presence.

use tracing::info;

use murmur_shared::validation::{normalize_username, validate_display_name};
use murmur_shared::UserId;
use murmur_store::{ChatStore, NewUser, ProfileUpdate, User};

use crate::error::ServerError;
use crate::messaging::require_user;

pub fn register_user(store: &dyn ChatStore, request: NewUser) -> Result<User, ServerError> {
    let username = normalize_username(&request.username)?;
    if let Some(name) = &request.name {
        validate_display_name(name)?;
    }

    let user = store.create_user(NewUser {
        username,
        ..request
    })?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

pub fn get_user(store: &dyn ChatStore, id: UserId) -> Result<User, ServerError> {
    require_user(store, id)
}

pub fn get_user_by_username(store: &dyn ChatStore, username: &str) -> Result<User, ServerError> {
    store
        .get_user_by_username(username.trim())?
        .ok_or_else(|| ServerError::NotFound(format!("user '{username}'")))
}

pub fn list_users(store: &dyn ChatStore) -> Result<Vec<User>, ServerError> {
    Ok(store.list_users()?)
}

pub fn update_profile(
    store: &dyn ChatStore,
    id: UserId,
    update: ProfileUpdate,
) -> Result<User, ServerError> {
    if let Some(name) = &update.name {
        validate_display_name(name)?;
    }
    store
        .update_profile(id, update)?
        .ok_or_else(|| ServerError::NotFound(format!("user {id}")))
}

pub fn set_presence(store: &dyn ChatStore, id: UserId, is_online: bool) -> Result<User, ServerError> {
    let user = store
        .set_online(id, is_online)?
        .ok_or_else(|| ServerError::NotFound(format!("user {id}")))?;
    info!(user_id = %id, is_online, "presence changed");
    Ok(user)
}
