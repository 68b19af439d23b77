use crate::store::{Store, StoreResult, UserSearch};
use crate::threads::{populate, FEED_DEPTH};
use crate::utils::{Context, Page};
use crate::views::user_view;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use threads_common::errors::ThreadsServerError;
use threads_common::http::requests::SortOrder;
use threads_common::http::responses::{ThreadView, UserPage, UserThreads, UserView};
use threads_common::models::{user::UserProfile, User};
use tracing::info;

/// USER FUNCTIONS ///

/**
 * Create or edit the profile of a user and mark them onboarded
 *
 * @param profile - the profile fields; the username is stored lowercase
 * @returns - the stored user, or UsernameTaken if another account owns the username
 */
pub async fn update_user<S: Store + ?Sized>(
    store: &S,
    mut profile: UserProfile,
) -> Result<UserView, ThreadsServerError> {
    profile.username = profile.username.trim().to_lowercase();
    let user = store
        .upsert_user(&profile)
        .await
        .context("Failed to create/update user")?;
    info!("User {} saved as @{}", user.external_id, user.username);
    Ok(user_view(&user, &[]))
}

/**
 * Look up a user by their identity provider id
 *
 * @param external_id - the id carried in the identity header
 * @returns - the user document, or UserNotFound
 */
pub async fn resolve_user<S: Store + ?Sized>(
    store: &S,
    external_id: &str,
) -> Result<User, ThreadsServerError> {
    store
        .find_user_by_external_id(external_id)
        .await
        .and_then(|user| {
            user.ok_or_else(|| ThreadsServerError::UserNotFound(external_id.to_string()))
        })
        .context("Failed to fetch user")
}

/**
 * Get a user's profile with the threads they like
 *
 * @param external_id - the identity provider id
 * @returns - the profile, or None if the user has not onboarded
 */
pub async fn fetch_user<S: Store + ?Sized>(
    store: &S,
    external_id: &str,
) -> Result<Option<UserView>, ThreadsServerError> {
    profile(store, external_id)
        .await
        .context("Failed to fetch user")
}

async fn profile<S: Store + ?Sized>(store: &S, external_id: &str) -> StoreResult<Option<UserView>> {
    let Some(user) = store.find_user_by_external_id(external_id).await? else {
        return Ok(None);
    };
    let likes = match &user.id {
        Some(id) => store.find_likes_by_user(id).await?,
        None => vec![],
    };
    Ok(Some(user_view(&user, &likes)))
}

/**
 * Get a user with their root threads in the order they were posted
 *
 * @param external_id - the identity provider id
 * @returns - the user and populated threads, or None if the user does not exist
 */
pub async fn fetch_user_posts<S: Store + ?Sized>(
    store: &S,
    external_id: &str,
) -> Result<Option<UserThreads>, ThreadsServerError> {
    posts(store, external_id)
        .await
        .context("Failed to fetch posts")
}

async fn posts<S: Store + ?Sized>(store: &S, external_id: &str) -> StoreResult<Option<UserThreads>> {
    let Some(user) = store.find_user_by_external_id(external_id).await? else {
        return Ok(None);
    };
    let mut found: HashMap<ObjectId, _> = store
        .find_threads_by_ids(&user.threads)
        .await?
        .into_iter()
        .filter_map(|thread| thread.id.map(|id| (id, thread)))
        .collect();
    let owned = user
        .threads
        .iter()
        .filter_map(|id| found.remove(id))
        .collect();
    let threads = populate(store, owned, FEED_DEPTH).await?;
    let likes = match &user.id {
        Some(id) => store.find_likes_by_user(id).await?,
        None => vec![],
    };
    Ok(Some(UserThreads {
        user: user_view(&user, &likes),
        threads,
    }))
}

/**
 * Get every reply written by a user, newest first
 *
 * @param author - the _id of the user
 * @returns - the populated replies
 */
pub async fn fetch_user_replies<S: Store + ?Sized>(
    store: &S,
    author: &ObjectId,
) -> Result<Vec<ThreadView>, ThreadsServerError> {
    replies(store, author).await.context("Failed to fetch posts")
}

async fn replies<S: Store + ?Sized>(store: &S, author: &ObjectId) -> StoreResult<Vec<ThreadView>> {
    let replies = store.find_replies_by_author(author).await?;
    populate(store, replies, FEED_DEPTH).await
}

/**
 * Search other users by username or display name
 *
 * @param requester - external id of the caller, never included in the results
 * @param search - literal, case-insensitive substring; blank matches everyone
 * @param page - the page to return
 * @param sort - order by account creation time
 * @returns - the matching users and whether another page exists
 */
pub async fn fetch_users<S: Store + ?Sized>(
    store: &S,
    requester: &str,
    search: &str,
    page: Page,
    sort: SortOrder,
) -> Result<UserPage, ThreadsServerError> {
    let filter = UserSearch {
        exclude_external_id: requester.to_string(),
        search: search.trim().to_string(),
        skip: page.skip(),
        limit: page.size,
        sort,
    };
    let (users, total) = store
        .search_users(&filter)
        .await
        .context("Failed to fetch users")?;
    let is_next = page.is_next(total, users.len());
    Ok(UserPage {
        users: users.iter().map(|user| user_view(user, &[])).collect(),
        is_next,
    })
}
