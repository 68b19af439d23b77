use mongodb::bson::oid::ObjectId;
use threads_common::errors::ThreadsServerError;
use threads_common::http::requests::SortOrder;
use threads_common::models::{user::UserProfile, Like, Thread, User};

pub type StoreResult<T> = Result<T, ThreadsServerError>;

/// Filter for the paginated user search
#[derive(Debug, Clone)]
pub struct UserSearch {
    pub exclude_external_id: String,
    pub search: String,
    pub skip: u64,
    pub limit: u64,
    pub sort: SortOrder,
}

#[rocket::async_trait]
pub trait UserRepository: Send + Sync {
    /// Create or update the profile keyed by external id, marking it onboarded
    async fn upsert_user(&self, profile: &UserProfile) -> StoreResult<User>;

    async fn find_user(&self, id: &ObjectId) -> StoreResult<Option<User>>;

    async fn find_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>>;

    async fn find_users_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>>;

    async fn push_user_thread(&self, user: &ObjectId, thread: &ObjectId) -> StoreResult<()>;

    /// Remove every id in `threads` from the `threads` list of each user in `users`
    async fn pull_user_threads(&self, users: &[ObjectId], threads: &[ObjectId])
        -> StoreResult<u64>;

    /// Returns the requested page and the total number of matches
    async fn search_users(&self, search: &UserSearch) -> StoreResult<(Vec<User>, u64)>;
}

#[rocket::async_trait]
pub trait ThreadRepository: Send + Sync {
    async fn insert_thread(&self, thread: &Thread) -> StoreResult<ObjectId>;

    async fn find_thread(&self, id: &ObjectId) -> StoreResult<Option<Thread>>;

    async fn find_threads_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<Thread>>;

    /// Direct replies, found through their `parent_id`
    async fn find_child_threads(&self, parent: &ObjectId) -> StoreResult<Vec<Thread>>;

    async fn find_threads_by_author(&self, author: &ObjectId) -> StoreResult<Vec<Thread>>;

    async fn find_replies_by_author(&self, author: &ObjectId) -> StoreResult<Vec<Thread>>;

    /// Root threads newest first
    async fn find_root_threads(&self, skip: u64, limit: u64) -> StoreResult<Vec<Thread>>;

    async fn count_root_threads(&self) -> StoreResult<u64>;

    async fn push_thread_child(&self, parent: &ObjectId, child: &ObjectId) -> StoreResult<()>;

    async fn pull_thread_child(&self, parent: &ObjectId, child: &ObjectId) -> StoreResult<()>;

    async fn delete_threads(&self, ids: &[ObjectId]) -> StoreResult<u64>;
}

#[rocket::async_trait]
pub trait LikeRepository: Send + Sync {
    /// Returns false when the edge already existed
    async fn insert_like(&self, like: &Like) -> StoreResult<bool>;

    /// Returns false when there was no edge to remove
    async fn delete_like(&self, thread: &ObjectId, user: &ObjectId) -> StoreResult<bool>;

    async fn count_likes(&self, thread: &ObjectId) -> StoreResult<u64>;

    async fn find_likes_for_threads(&self, threads: &[ObjectId]) -> StoreResult<Vec<Like>>;

    async fn find_likes_by_user(&self, user: &ObjectId) -> StoreResult<Vec<Like>>;

    async fn delete_likes_for_threads(&self, threads: &[ObjectId]) -> StoreResult<u64>;
}

/// Everything the actions need from the document store
pub trait Store: UserRepository + ThreadRepository + LikeRepository {}

impl<T> Store for T where T: UserRepository + ThreadRepository + LikeRepository {}
