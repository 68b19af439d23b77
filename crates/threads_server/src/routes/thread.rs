use crate::activity::get_activity;
use crate::catchers::ThreadsResponse;
use crate::guards::AuthenticatedUser;
use crate::store::Store;
use crate::threads::{
    add_comment, authorize_delete, create_thread, delete_thread, fetch_posts, fetch_thread_by_id,
    like_or_unlike_post,
};
use crate::users::resolve_user;
use crate::utils::{parse_oid, Page};
use mongodb::bson::oid::ObjectId;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use std::sync::Arc;
use threads_common::errors::ThreadsServerError;
use threads_common::http::requests::{AddCommentRequest, CreateThreadRequest, LikeRequest};
use threads_common::http::responses::{
    Activity, DeleteSummary, FeedPage, LikeToggle, MutationResponse, ThreadView,
};
use threads_common::MIN_THREAD_CHARS;

type Created<T> = (Status, Json<MutationResponse<T>>);

fn check_text(text: &str) -> Result<(), ThreadsServerError> {
    match text.trim().chars().count() < MIN_THREAD_CHARS {
        true => Err(ThreadsServerError::TextTooShort(MIN_THREAD_CHARS)),
        false => Ok(()),
    }
}

async fn caller_id(store: &dyn Store, user: &AuthenticatedUser) -> Result<ObjectId, ThreadsServerError> {
    let user = resolve_user(store, &user.0).await?;
    user.id
        .ok_or_else(|| ThreadsServerError::UserNotFound(user.external_id.clone()))
}

/// POST REQUESTS ///

/**
 * Post a new root thread as the caller
 *
 * @param request - the CreateThreadRequest containing:
 *             * text: the body, at least 3 characters
 *             * path: the view to revalidate afterwards
 * @return status:
 *             * 201 with the new thread id
 *             * 400 if the text is too short
 *             * 401 if the identity header is missing
 *             * 404 if the caller has no profile
 */
#[post("/", format = "json", data = "<request>")]
pub async fn post_thread(
    user: AuthenticatedUser,
    request: Json<CreateThreadRequest>,
    store: &State<Arc<dyn Store>>,
) -> Result<Created<String>, ThreadsResponse> {
    check_text(&request.text)?;
    let store = store.inner().as_ref();
    let author = caller_id(store, &user).await?;
    let id = create_thread(store, request.text.trim(), &author, None).await?;
    Ok((
        Status::Created,
        Json(MutationResponse {
            data: id.to_hex(),
            revalidate: request.path.clone(),
        }),
    ))
}

/**
 * Reply to a thread as the caller
 *
 * @return status:
 *             * 201 with the new reply id
 *             * 400 if the text is too short or the id is malformed
 *             * 401 if the identity header is missing
 *             * 404 if the parent thread or the caller does not exist
 */
#[post("/<id>/reply", format = "json", data = "<request>")]
pub async fn post_reply(
    user: AuthenticatedUser,
    id: &str,
    request: Json<AddCommentRequest>,
    store: &State<Arc<dyn Store>>,
) -> Result<Created<String>, ThreadsResponse> {
    let parent = parse_oid(id)?;
    check_text(&request.text)?;
    let store = store.inner().as_ref();
    let author = caller_id(store, &user).await?;
    let reply = add_comment(store, &parent, request.text.trim(), &author).await?;
    Ok((
        Status::Created,
        Json(MutationResponse {
            data: reply.to_hex(),
            revalidate: request.path.clone(),
        }),
    ))
}

/**
 * Like the thread, or remove the caller's like if it is already there
 *
 * @return status:
 *             * 200 with the new like state
 *             * 404 if the thread or the caller does not exist
 */
#[post("/<id>/like", data = "<request>")]
pub async fn toggle_like(
    user: AuthenticatedUser,
    id: &str,
    request: Option<Json<LikeRequest>>,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<MutationResponse<LikeToggle>>, ThreadsResponse> {
    let thread = parse_oid(id)?;
    let toggle = like_or_unlike_post(store.inner().as_ref(), &thread, &user.0).await?;
    Ok(Json(MutationResponse {
        data: toggle,
        revalidate: request.and_then(|r| r.into_inner().path),
    }))
}

/// DELETE REQUESTS ///

/**
 * Delete a thread and everything below it
 *
 * @param path - the view to revalidate afterwards
 * @return status:
 *             * 200 with the ids that were removed
 *             * 403 if the caller did not write the thread
 *             * 404 if the thread does not exist
 */
#[delete("/<id>?<path>")]
pub async fn remove_thread(
    user: AuthenticatedUser,
    id: &str,
    path: Option<String>,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<MutationResponse<DeleteSummary>>, ThreadsResponse> {
    let thread = parse_oid(id)?;
    let store = store.inner().as_ref();
    authorize_delete(store, &thread, &user.0).await?;
    let summary = delete_thread(store, &thread).await?;
    Ok(Json(MutationResponse {
        data: summary,
        revalidate: path,
    }))
}

/// GET REQUESTS ///

#[get("/feed?<page>&<size>")]
pub async fn get_feed(
    page: Option<u64>,
    size: Option<u64>,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<FeedPage>, ThreadsResponse> {
    let feed = fetch_posts(store.inner().as_ref(), Page::new(page, size)).await?;
    Ok(Json(feed))
}

/**
 * Replies and likes left by other users on the caller's threads
 *
 * @return status:
 *             * 200 with the activity
 *             * 401 if the identity header is missing
 *             * 404 if the caller has no profile
 */
#[get("/activity")]
pub async fn get_caller_activity(
    user: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<Activity>, ThreadsResponse> {
    let store = store.inner().as_ref();
    let owner = caller_id(store, &user).await?;
    Ok(Json(get_activity(store, &owner).await?))
}

#[get("/<id>")]
pub async fn get_thread(
    id: &str,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<ThreadView>, ThreadsResponse> {
    let thread = parse_oid(id)?;
    match fetch_thread_by_id(store.inner().as_ref(), &thread).await? {
        Some(view) => Ok(Json(view)),
        None => Err(ThreadsServerError::ThreadNotFound(id.to_string()).into()),
    }
}
