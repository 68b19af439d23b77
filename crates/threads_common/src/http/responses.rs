use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The slice of a user shown next to a thread or an activity entry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthorSummary {
    pub id: String,
    pub external_id: String,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
}

/// A thread with its references resolved. Replies are populated down to the
/// depth the query asked for; below that `children` is empty and only
/// `reply_count` tells the caller more replies exist.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ThreadView {
    pub id: String,
    pub text: String,
    pub author: Option<AuthorSummary>,
    pub parent_id: Option<String>,
    pub community: Option<String>,
    pub likes: Vec<String>, // external ids of likers
    pub reply_count: usize,
    pub children: Vec<ThreadView>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserView {
    pub id: String,
    pub external_id: String,
    pub username: String,
    pub name: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub onboarded: bool,
    pub threads: Vec<String>,
    pub communities: Vec<String>,
    pub liked_threads: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserThreads {
    pub user: UserView,
    pub threads: Vec<ThreadView>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FeedPage {
    pub posts: Vec<ThreadView>,
    pub is_next: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserPage {
    pub users: Vec<UserView>,
    pub is_next: bool,
}

/// Someone other than the owner liked one of the owner's threads
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LikeActivity {
    pub user_id: String,
    pub name: String,
    pub image: Option<String>,
    pub thread_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Activity {
    pub replies: Vec<ThreadView>,
    pub likes: Vec<LikeActivity>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LikeToggle {
    pub liked: bool,
    pub like_count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeleteSummary {
    pub deleted_threads: Vec<String>,
    pub authors: Vec<String>,
    pub likers: Vec<String>,
}

/// Returned by mutations so the caller knows what was written and which view
/// it should refresh
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MutationResponse<T> {
    pub data: T,
    pub revalidate: Option<String>,
}
