use crate::catchers::ThreadsResponse;
use crate::guards::AuthenticatedUser;
use crate::store::Store;
use crate::users::{
    fetch_user, fetch_user_posts, fetch_user_replies, fetch_users, resolve_user, update_user,
};
use crate::utils::Page;
use rocket::serde::json::Json;
use rocket::State;
use std::sync::Arc;
use threads_common::errors::ThreadsServerError;
use threads_common::http::requests::{SortOrder, UpdateUserRequest};
use threads_common::http::responses::{MutationResponse, ThreadView, UserPage, UserThreads, UserView};
use threads_common::models::user::UserProfile;

/// PUT REQUESTS ///

/**
 * Create or edit the caller's profile
 *
 * @param request - the UpdateUserRequest containing:
 *             * username: stored lowercase, unique across users
 *             * name: the display name
 *             * bio, image: optional profile fields
 *             * path: the view to revalidate afterwards
 * @return status:
 *             * 200 with the saved profile
 *             * 401 if the identity header is missing
 *             * 409 if the username belongs to another user
 */
#[put("/", format = "json", data = "<request>")]
pub async fn put_user(
    user: AuthenticatedUser,
    request: Json<UpdateUserRequest>,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<MutationResponse<UserView>>, ThreadsResponse> {
    let request = request.into_inner();
    let profile = UserProfile {
        external_id: user.0,
        username: request.username,
        name: request.name,
        bio: request.bio,
        image: request.image,
    };
    let saved = update_user(store.inner().as_ref(), profile).await?;
    Ok(Json(MutationResponse {
        data: saved,
        revalidate: request.path,
    }))
}

/// GET REQUESTS ///

/**
 * Search other users by username or name
 *
 * @param q - literal, case-insensitive substring
 * @param sort - "asc" or "desc" by account creation, newest first by default
 */
#[get("/search?<q>&<page>&<size>&<sort>")]
pub async fn search_users(
    user: AuthenticatedUser,
    q: Option<String>,
    page: Option<u64>,
    size: Option<u64>,
    sort: Option<String>,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<UserPage>, ThreadsResponse> {
    let sort = sort
        .as_deref()
        .and_then(SortOrder::parse)
        .unwrap_or_default();
    let found = fetch_users(
        store.inner().as_ref(),
        &user.0,
        q.as_deref().unwrap_or_default(),
        Page::new(page, size),
        sort,
    )
    .await?;
    Ok(Json(found))
}

#[get("/<id>")]
pub async fn get_user(
    id: &str,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<UserView>, ThreadsResponse> {
    match fetch_user(store.inner().as_ref(), id).await? {
        Some(user) => Ok(Json(user)),
        None => Err(ThreadsServerError::UserNotFound(id.to_string()).into()),
    }
}

#[get("/<id>/threads")]
pub async fn get_user_threads(
    id: &str,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<UserThreads>, ThreadsResponse> {
    match fetch_user_posts(store.inner().as_ref(), id).await? {
        Some(posts) => Ok(Json(posts)),
        None => Err(ThreadsServerError::UserNotFound(id.to_string()).into()),
    }
}

#[get("/<id>/replies")]
pub async fn get_user_replies(
    id: &str,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<Vec<ThreadView>>, ThreadsResponse> {
    let store = store.inner().as_ref();
    let user = resolve_user(store, id).await?;
    let replies = match &user.id {
        Some(author) => fetch_user_replies(store, author).await?,
        None => vec![],
    };
    Ok(Json(replies))
}
