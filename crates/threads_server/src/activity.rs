use crate::store::{Store, StoreResult};
use crate::threads::{distinct, populate};
use crate::utils::Context;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use threads_common::errors::ThreadsServerError;
use threads_common::http::responses::{Activity, LikeActivity};
use threads_common::models::User;

/**
 * Replies and likes other users left on the owner's threads
 *
 * @param owner - the _id of the user whose threads are inspected
 * @returns - replies not written by the owner, and likes not made by the owner
 */
pub async fn get_activity<S: Store + ?Sized>(
    store: &S,
    owner: &ObjectId,
) -> Result<Activity, ThreadsServerError> {
    aggregate(store, owner)
        .await
        .context("Failed to fetch activity")
}

async fn aggregate<S: Store + ?Sized>(store: &S, owner: &ObjectId) -> StoreResult<Activity> {
    let owned = store.find_threads_by_author(owner).await?;
    let owned_ids: Vec<ObjectId> = owned.iter().filter_map(|t| t.id).collect();
    let candidates: Vec<ObjectId> = owned
        .iter()
        .flat_map(|t| t.children.iter().copied())
        .collect();

    let likes: Vec<_> = store
        .find_likes_for_threads(&owned_ids)
        .await?
        .into_iter()
        .filter(|like| like.user != *owner)
        .collect();
    let likers: HashMap<ObjectId, User> = store
        .find_users_by_ids(&distinct(likes.iter().map(|like| like.user)))
        .await?
        .into_iter()
        .filter_map(|user| user.id.map(|id| (id, user)))
        .collect();
    let likes = likes
        .iter()
        .filter_map(|like| {
            likers.get(&like.user).map(|user| LikeActivity {
                user_id: user.external_id.clone(),
                name: user.name.clone(),
                image: user.image.clone(),
                thread_id: like.thread.to_hex(),
            })
        })
        .collect();

    let mut replies: Vec<_> = store
        .find_threads_by_ids(&candidates)
        .await?
        .into_iter()
        .filter(|reply| reply.author != *owner)
        .collect();
    // newest first for display; callers get no ordering guarantee
    replies.sort_by_key(|reply| std::cmp::Reverse((reply.created_at, reply.id)));
    let replies = populate(store, replies, 0).await?;

    Ok(Activity { replies, likes })
}
