use crate::store::{Store, StoreResult};
use crate::utils::{Context, Page};
use crate::views::thread_view;
use mongodb::bson::oid::ObjectId;
use std::collections::{HashMap, HashSet};
use threads_common::errors::ThreadsServerError;
use threads_common::http::responses::{DeleteSummary, FeedPage, LikeToggle, ThreadView};
use threads_common::models::{Like, Thread, User};
use tracing::{debug, info};

/// Reply levels resolved for the root feed and profile tabs
pub const FEED_DEPTH: usize = 1;
/// Reply levels resolved when a single thread is opened
pub const THREAD_DEPTH: usize = 2;

/**
 * Resolve authors, likers and up to `depth` levels of replies for a list of threads
 * @dev one query per reply level, then one for likes and one for users
 *
 * @param threads - the top level threads, returned in the same order
 * @param depth - how many levels of `children` to load below them
 */
pub(crate) async fn populate<S: Store + ?Sized>(
    store: &S,
    threads: Vec<Thread>,
    depth: usize,
) -> StoreResult<Vec<ThreadView>> {
    let mut levels: Vec<Vec<Thread>> = vec![threads];
    for _ in 0..depth {
        let child_ids: Vec<ObjectId> = levels
            .last()
            .map(|level| level.iter().flat_map(|t| t.children.iter().copied()).collect())
            .unwrap_or_default();
        if child_ids.is_empty() {
            break;
        }
        levels.push(store.find_threads_by_ids(&child_ids).await?);
    }

    let thread_ids: Vec<ObjectId> = levels.iter().flatten().filter_map(|t| t.id).collect();
    let likes = store.find_likes_for_threads(&thread_ids).await?;
    let user_ids = distinct(
        levels
            .iter()
            .flatten()
            .map(|t| t.author)
            .chain(likes.iter().map(|like| like.user)),
    );
    let users: HashMap<ObjectId, User> = store
        .find_users_by_ids(&user_ids)
        .await?
        .into_iter()
        .filter_map(|user| user.id.map(|id| (id, user)))
        .collect();
    let mut likers: HashMap<ObjectId, Vec<String>> = HashMap::new();
    for like in &likes {
        if let Some(user) = users.get(&like.user) {
            likers
                .entry(like.thread)
                .or_default()
                .push(user.external_id.clone());
        }
    }

    // build bottom up so each level can take ownership of its children's views
    let mut populated: HashMap<ObjectId, ThreadView> = HashMap::new();
    while let Some(level) = levels.pop() {
        let views: Vec<(Option<ObjectId>, ThreadView)> = level
            .iter()
            .map(|thread| {
                let children = thread
                    .children
                    .iter()
                    .filter_map(|child| populated.remove(child))
                    .collect();
                (thread.id, thread_view(thread, children, &users, &likers))
            })
            .collect();
        if levels.is_empty() {
            return Ok(views.into_iter().map(|(_, view)| view).collect());
        }
        populated = views
            .into_iter()
            .filter_map(|(id, view)| id.map(|id| (id, view)))
            .collect();
    }
    Ok(vec![])
}

pub(crate) fn distinct(ids: impl IntoIterator<Item = ObjectId>) -> Vec<ObjectId> {
    let mut ids: Vec<ObjectId> = ids.into_iter().collect();
    ids.sort();
    ids.dedup();
    ids
}

async fn require_user<S: Store + ?Sized>(store: &S, id: &ObjectId) -> StoreResult<User> {
    store
        .find_user(id)
        .await?
        .ok_or_else(|| ThreadsServerError::UserNotFound(id.to_hex()))
}

async fn require_thread<S: Store + ?Sized>(store: &S, id: &ObjectId) -> StoreResult<Thread> {
    store
        .find_thread(id)
        .await?
        .ok_or_else(|| ThreadsServerError::ThreadNotFound(id.to_hex()))
}

/// POST FUNCTIONS ///

/**
 * Create a thread and record it in the author's `threads`. With a parent the new
 * thread is also appended to the parent's `children`
 *
 * @param text - the body of the thread
 * @param author - the _id of the authoring user
 * @param parent - the thread being replied to, if any
 * @returns - the id of the new thread
 */
pub async fn create_thread<S: Store + ?Sized>(
    store: &S,
    text: &str,
    author: &ObjectId,
    parent: Option<&ObjectId>,
) -> Result<ObjectId, ThreadsServerError> {
    insert_owned(store, text, author, parent)
        .await
        .context("Error in creating thread")
}

async fn insert_owned<S: Store + ?Sized>(
    store: &S,
    text: &str,
    author: &ObjectId,
    parent: Option<&ObjectId>,
) -> StoreResult<ObjectId> {
    let id = match parent {
        Some(parent) => insert_reply(store, parent, text, author).await?,
        None => {
            require_user(store, author).await?;
            store
                .insert_thread(&Thread::new(text.to_string(), *author, None))
                .await?
        }
    };
    store.push_user_thread(author, &id).await?;
    info!("Thread {} created by {}", id, author);
    Ok(id)
}

/**
 * Reply to an existing thread
 *
 * @param parent - the thread being replied to
 * @param text - the body of the reply
 * @param author - the _id of the replying user
 * @returns - the id of the reply, or ThreadNotFound if the parent is gone
 */
pub async fn add_comment<S: Store + ?Sized>(
    store: &S,
    parent: &ObjectId,
    text: &str,
    author: &ObjectId,
) -> Result<ObjectId, ThreadsServerError> {
    insert_reply(store, parent, text, author)
        .await
        .context("Error in adding comment")
}

async fn insert_reply<S: Store + ?Sized>(
    store: &S,
    parent: &ObjectId,
    text: &str,
    author: &ObjectId,
) -> StoreResult<ObjectId> {
    require_thread(store, parent).await?;
    require_user(store, author).await?;
    let id = store
        .insert_thread(&Thread::new(text.to_string(), *author, Some(*parent)))
        .await?;
    store.push_thread_child(parent, &id).await?;
    info!("Reply {} added to thread {} by {}", id, parent, author);
    Ok(id)
}

/**
 * Like the thread, or take the like back if the user already liked it
 *
 * @param thread - the thread to toggle
 * @param external_id - the identity provider id of the user
 * @returns - whether the thread is now liked and its like count
 */
pub async fn like_or_unlike_post<S: Store + ?Sized>(
    store: &S,
    thread: &ObjectId,
    external_id: &str,
) -> Result<LikeToggle, ThreadsServerError> {
    toggle_like(store, thread, external_id)
        .await
        .context("Error in liking or unliking the thread")
}

async fn toggle_like<S: Store + ?Sized>(
    store: &S,
    thread: &ObjectId,
    external_id: &str,
) -> StoreResult<LikeToggle> {
    require_thread(store, thread).await?;
    let user = store
        .find_user_by_external_id(external_id)
        .await?
        .and_then(|user| user.id)
        .ok_or_else(|| ThreadsServerError::UserNotFound(external_id.to_string()))?;
    let liked = match store.delete_like(thread, &user).await? {
        true => false,
        false => {
            store.insert_like(&Like::new(*thread, user)).await?;
            true
        }
    };
    let like_count = store.count_likes(thread).await?;
    debug!("User {} liked={} thread {}", user, liked, thread);
    Ok(LikeToggle { liked, like_count })
}

/// GET FUNCTIONS ///

/**
 * Get one thread with two levels of replies
 *
 * @param id - the thread to fetch
 * @returns - the populated thread, or None if it does not exist
 */
pub async fn fetch_thread_by_id<S: Store + ?Sized>(
    store: &S,
    id: &ObjectId,
) -> Result<Option<ThreadView>, ThreadsServerError> {
    let thread = match store.find_thread(id).await.context("Failed to get thread")? {
        Some(thread) => thread,
        None => return Ok(None),
    };
    let mut views = populate(store, vec![thread], THREAD_DEPTH)
        .await
        .context("Failed to get thread")?;
    Ok(views.pop())
}

/**
 * Get a page of root threads, newest first
 *
 * @param page - the 1-based page number and page size
 * @returns - the posts and whether another page exists
 */
pub async fn fetch_posts<S: Store + ?Sized>(
    store: &S,
    page: Page,
) -> Result<FeedPage, ThreadsServerError> {
    feed(store, page).await.context("Error in fetching posts")
}

async fn feed<S: Store + ?Sized>(store: &S, page: Page) -> StoreResult<FeedPage> {
    let roots = store.find_root_threads(page.skip(), page.size).await?;
    let total = store.count_root_threads().await?;
    let is_next = page.is_next(total, roots.len());
    let posts = populate(store, roots, FEED_DEPTH).await?;
    Ok(FeedPage { posts, is_next })
}

/// DELETE FUNCTIONS ///

/**
 * Every thread below `root`, found through `parent_id` with an explicit stack
 * @dev each thread is visited once even if the stored links form a cycle
 */
pub(crate) async fn collect_descendants<S: Store + ?Sized>(
    store: &S,
    root: &ObjectId,
) -> StoreResult<Vec<Thread>> {
    let mut descendants = vec![];
    let mut visited: HashSet<ObjectId> = HashSet::from([*root]);
    let mut stack = vec![*root];
    while let Some(current) = stack.pop() {
        for child in store.find_child_threads(&current).await? {
            let Some(child_id) = child.id else {
                continue;
            };
            if visited.insert(child_id) {
                stack.push(child_id);
                descendants.push(child);
            }
        }
    }
    Ok(descendants)
}

/**
 * Ensure the caller wrote the thread they are about to delete
 *
 * @param id - the thread to delete
 * @param external_id - the identity provider id of the caller
 * @returns - NotThreadAuthor if someone else wrote it, NotFound if either side is missing
 */
pub async fn authorize_delete<S: Store + ?Sized>(
    store: &S,
    id: &ObjectId,
    external_id: &str,
) -> Result<(), ThreadsServerError> {
    check_author(store, id, external_id)
        .await
        .context("Failed to delete thread")
}

async fn check_author<S: Store + ?Sized>(
    store: &S,
    id: &ObjectId,
    external_id: &str,
) -> StoreResult<()> {
    let thread = require_thread(store, id).await?;
    let author = require_user(store, &thread.author).await?;
    match author.external_id == external_id {
        true => Ok(()),
        false => Err(ThreadsServerError::NotThreadAuthor(
            external_id.to_string(),
            id.to_hex(),
        )),
    }
}

/**
 * Delete a thread and all of its descendants, then clear every reference to them
 * @dev references are removed before documents and the root document goes last, so
 *      if any step fails the root is still there and the call can simply be repeated
 *
 * @param id - the thread to delete
 * @returns - the deleted ids and the users whose references were cleared
 */
pub async fn delete_thread<S: Store + ?Sized>(
    store: &S,
    id: &ObjectId,
) -> Result<DeleteSummary, ThreadsServerError> {
    delete_subtree(store, id)
        .await
        .context("Failed to delete thread")
}

async fn delete_subtree<S: Store + ?Sized>(store: &S, id: &ObjectId) -> StoreResult<DeleteSummary> {
    let root = require_thread(store, id).await?;
    let descendants = collect_descendants(store, id).await?;

    let descendant_ids: Vec<ObjectId> = descendants.iter().filter_map(|t| t.id).collect();
    let mut thread_ids = vec![*id];
    thread_ids.extend(descendant_ids.iter().copied());
    let authors = distinct(
        std::iter::once(root.author).chain(descendants.iter().map(|t| t.author)),
    );
    let likes = store.find_likes_for_threads(&thread_ids).await?;
    let likers = distinct(likes.iter().map(|like| like.user));

    if let Some(parent) = &root.parent_id {
        store.pull_thread_child(parent, id).await?;
    }
    store.pull_user_threads(&authors, &thread_ids).await?;
    store.delete_likes_for_threads(&thread_ids).await?;
    store.delete_threads(&descendant_ids).await?;
    store.delete_threads(&[*id]).await?;
    info!(
        "Deleted thread {} with {} descendants",
        id,
        descendant_ids.len()
    );

    Ok(DeleteSummary {
        deleted_threads: thread_ids.iter().map(|id| id.to_hex()).collect(),
        authors: authors.iter().map(|id| id.to_hex()).collect(),
        likers: likers.iter().map(|id| id.to_hex()).collect(),
    })
}
