use crate::store::{LikeRepository, StoreResult, ThreadRepository, UserRepository, UserSearch};
use mongodb::bson::{oid::ObjectId, DateTime};
use regex::RegexBuilder;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use threads_common::errors::ThreadsServerError;
use threads_common::http::requests::SortOrder;
use threads_common::models::{user::UserProfile, Like, Thread, User};
use tokio::sync::RwLock;

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    threads: Vec<Thread>,
    likes: Vec<Like>,
}

/// In-process stand-in for `ThreadsDB`, used by the action and route tests
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    fail_thread_deletes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `delete_threads` fail until switched back off
    pub fn fail_thread_deletes(&self, fail: bool) {
        self.fail_thread_deletes.store(fail, Ordering::SeqCst);
    }

    /// Onboard a user with a display name derived from the username
    pub async fn add_user(&self, external_id: &str, username: &str) -> User {
        let profile = UserProfile {
            external_id: external_id.to_string(),
            username: username.to_string(),
            name: format!("{} name", username),
            bio: None,
            image: Some(format!("https://img.example/{}.png", username)),
        };
        self.upsert_user(&profile)
            .await
            .expect("failed to add user")
    }

    pub async fn all_threads(&self) -> Vec<Thread> {
        self.collections.read().await.threads.clone()
    }

    pub async fn all_likes(&self) -> Vec<Like> {
        self.collections.read().await.likes.clone()
    }
}

#[rocket::async_trait]
impl UserRepository for MemoryStore {
    async fn upsert_user(&self, profile: &UserProfile) -> StoreResult<User> {
        let mut collections = self.collections.write().await;
        let taken = collections
            .users
            .iter()
            .any(|u| u.username == profile.username && u.external_id != profile.external_id);
        if taken {
            return Err(ThreadsServerError::UsernameTaken(profile.username.clone()));
        }
        let now = DateTime::now();
        match collections
            .users
            .iter_mut()
            .find(|u| u.external_id == profile.external_id)
        {
            Some(user) => {
                user.username = profile.username.clone();
                user.name = profile.name.clone();
                user.bio = profile.bio.clone();
                user.image = profile.image.clone();
                user.onboarded = true;
                user.updated_at = now;
                Ok(user.clone())
            }
            None => {
                let user = User {
                    id: Some(ObjectId::new()),
                    external_id: profile.external_id.clone(),
                    username: profile.username.clone(),
                    name: profile.name.clone(),
                    bio: profile.bio.clone(),
                    image: profile.image.clone(),
                    onboarded: true,
                    threads: vec![],
                    communities: vec![],
                    created_at: now,
                    updated_at: now,
                };
                collections.users.push(user.clone());
                Ok(user)
            }
        }
    }

    async fn find_user(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        let collections = self.collections.read().await;
        Ok(collections.users.iter().find(|u| u.id == Some(*id)).cloned())
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        let collections = self.collections.read().await;
        Ok(collections
            .users
            .iter()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn find_users_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>> {
        let collections = self.collections.read().await;
        Ok(collections
            .users
            .iter()
            .filter(|u| u.id.map_or(false, |id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn push_user_thread(&self, user: &ObjectId, thread: &ObjectId) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        if let Some(user) = collections.users.iter_mut().find(|u| u.id == Some(*user)) {
            user.threads.push(*thread);
        }
        Ok(())
    }

    async fn pull_user_threads(
        &self,
        users: &[ObjectId],
        threads: &[ObjectId],
    ) -> StoreResult<u64> {
        let mut collections = self.collections.write().await;
        let mut modified = 0;
        for user in collections
            .users
            .iter_mut()
            .filter(|u| u.id.map_or(false, |id| users.contains(&id)))
        {
            let before = user.threads.len();
            user.threads.retain(|t| !threads.contains(t));
            if user.threads.len() != before {
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn search_users(&self, search: &UserSearch) -> StoreResult<(Vec<User>, u64)> {
        let matcher = match search.search.trim().is_empty() {
            true => None,
            false => Some(
                RegexBuilder::new(&regex::escape(&search.search))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ThreadsServerError::MongoError(e.to_string()))?,
            ),
        };
        let collections = self.collections.read().await;
        let mut matched: Vec<&User> = collections
            .users
            .iter()
            .filter(|u| u.external_id != search.exclude_external_id)
            .filter(|u| match &matcher {
                Some(re) => re.is_match(&u.username) || re.is_match(&u.name),
                None => true,
            })
            .collect();
        matched.sort_by_key(|u| (u.created_at, u.id));
        if search.sort == SortOrder::Desc {
            matched.reverse();
        }
        let total = matched.len() as u64;
        let page = matched
            .into_iter()
            .skip(search.skip as usize)
            .take(search.limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }
}

#[rocket::async_trait]
impl ThreadRepository for MemoryStore {
    async fn insert_thread(&self, thread: &Thread) -> StoreResult<ObjectId> {
        let mut collections = self.collections.write().await;
        let id = ObjectId::new();
        let mut stored = thread.clone();
        stored.id = Some(id);
        collections.threads.push(stored);
        Ok(id)
    }

    async fn find_thread(&self, id: &ObjectId) -> StoreResult<Option<Thread>> {
        let collections = self.collections.read().await;
        Ok(collections
            .threads
            .iter()
            .find(|t| t.id == Some(*id))
            .cloned())
    }

    async fn find_threads_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<Thread>> {
        let collections = self.collections.read().await;
        Ok(collections
            .threads
            .iter()
            .filter(|t| t.id.map_or(false, |id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn find_child_threads(&self, parent: &ObjectId) -> StoreResult<Vec<Thread>> {
        let collections = self.collections.read().await;
        Ok(collections
            .threads
            .iter()
            .filter(|t| t.parent_id == Some(*parent))
            .cloned()
            .collect())
    }

    async fn find_threads_by_author(&self, author: &ObjectId) -> StoreResult<Vec<Thread>> {
        let collections = self.collections.read().await;
        Ok(collections
            .threads
            .iter()
            .filter(|t| t.author == *author)
            .cloned()
            .collect())
    }

    async fn find_replies_by_author(&self, author: &ObjectId) -> StoreResult<Vec<Thread>> {
        let collections = self.collections.read().await;
        let mut replies: Vec<Thread> = collections
            .threads
            .iter()
            .filter(|t| t.author == *author && !t.is_root())
            .cloned()
            .collect();
        replies.sort_by_key(|t| Reverse((t.created_at, t.id)));
        Ok(replies)
    }

    async fn find_root_threads(&self, skip: u64, limit: u64) -> StoreResult<Vec<Thread>> {
        let collections = self.collections.read().await;
        let mut roots: Vec<Thread> = collections
            .threads
            .iter()
            .filter(|t| t.is_root())
            .cloned()
            .collect();
        roots.sort_by_key(|t| Reverse((t.created_at, t.id)));
        Ok(roots
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_root_threads(&self) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        Ok(collections.threads.iter().filter(|t| t.is_root()).count() as u64)
    }

    async fn push_thread_child(&self, parent: &ObjectId, child: &ObjectId) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        if let Some(thread) = collections
            .threads
            .iter_mut()
            .find(|t| t.id == Some(*parent))
        {
            thread.children.push(*child);
        }
        Ok(())
    }

    async fn pull_thread_child(&self, parent: &ObjectId, child: &ObjectId) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        if let Some(thread) = collections
            .threads
            .iter_mut()
            .find(|t| t.id == Some(*parent))
        {
            thread.children.retain(|c| c != child);
        }
        Ok(())
    }

    async fn delete_threads(&self, ids: &[ObjectId]) -> StoreResult<u64> {
        if self.fail_thread_deletes.load(Ordering::SeqCst) {
            return Err(ThreadsServerError::MongoError(String::from(
                "connection reset by peer",
            )));
        }
        let mut collections = self.collections.write().await;
        let before = collections.threads.len();
        collections
            .threads
            .retain(|t| t.id.map_or(true, |id| !ids.contains(&id)));
        Ok((before - collections.threads.len()) as u64)
    }
}

#[rocket::async_trait]
impl LikeRepository for MemoryStore {
    async fn insert_like(&self, like: &Like) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let exists = collections
            .likes
            .iter()
            .any(|l| l.thread == like.thread && l.user == like.user);
        if exists {
            return Ok(false);
        }
        let mut stored = like.clone();
        stored.id = Some(ObjectId::new());
        collections.likes.push(stored);
        Ok(true)
    }

    async fn delete_like(&self, thread: &ObjectId, user: &ObjectId) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let before = collections.likes.len();
        collections
            .likes
            .retain(|l| !(l.thread == *thread && l.user == *user));
        Ok(collections.likes.len() != before)
    }

    async fn count_likes(&self, thread: &ObjectId) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        Ok(collections.likes.iter().filter(|l| l.thread == *thread).count() as u64)
    }

    async fn find_likes_for_threads(&self, threads: &[ObjectId]) -> StoreResult<Vec<Like>> {
        let collections = self.collections.read().await;
        Ok(collections
            .likes
            .iter()
            .filter(|l| threads.contains(&l.thread))
            .cloned()
            .collect())
    }

    async fn find_likes_by_user(&self, user: &ObjectId) -> StoreResult<Vec<Like>> {
        let collections = self.collections.read().await;
        Ok(collections
            .likes
            .iter()
            .filter(|l| l.user == *user)
            .cloned()
            .collect())
    }

    async fn delete_likes_for_threads(&self, threads: &[ObjectId]) -> StoreResult<u64> {
        let mut collections = self.collections.write().await;
        let before = collections.likes.len();
        collections.likes.retain(|l| !threads.contains(&l.thread));
        Ok((before - collections.likes.len()) as u64)
    }
}
