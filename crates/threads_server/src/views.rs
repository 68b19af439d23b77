use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use threads_common::http::responses::{AuthorSummary, ThreadView, UserView};
use threads_common::models::{Like, Thread, User};

pub fn author_summary(user: &User) -> AuthorSummary {
    AuthorSummary {
        id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
        external_id: user.external_id.clone(),
        username: user.username.clone(),
        name: user.name.clone(),
        image: user.image.clone(),
    }
}

/// `likes` are the user's like edges; they become `liked_threads`
pub fn user_view(user: &User, likes: &[Like]) -> UserView {
    UserView {
        id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
        external_id: user.external_id.clone(),
        username: user.username.clone(),
        name: user.name.clone(),
        bio: user.bio.clone(),
        image: user.image.clone(),
        onboarded: user.onboarded,
        threads: user.threads.iter().map(|id| id.to_hex()).collect(),
        communities: user.communities.iter().map(|id| id.to_hex()).collect(),
        liked_threads: likes.iter().map(|like| like.thread.to_hex()).collect(),
        created_at: user.created_at.to_chrono(),
    }
}

pub fn thread_view(
    thread: &Thread,
    children: Vec<ThreadView>,
    users: &HashMap<ObjectId, User>,
    likers: &HashMap<ObjectId, Vec<String>>,
) -> ThreadView {
    ThreadView {
        id: thread.id.map(|id| id.to_hex()).unwrap_or_default(),
        text: thread.text.clone(),
        author: users.get(&thread.author).map(author_summary),
        parent_id: thread.parent_id.map(|id| id.to_hex()),
        community: thread.community.map(|id| id.to_hex()),
        likes: thread
            .id
            .and_then(|id| likers.get(&id))
            .cloned()
            .unwrap_or_default(),
        reply_count: thread.children.len(),
        children,
        created_at: thread.created_at.to_chrono(),
    }
}
