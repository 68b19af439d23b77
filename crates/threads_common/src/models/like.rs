use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// One user liking one thread. Unique on (thread, user).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Like {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub thread: ObjectId,
    pub user: ObjectId,
    pub created_at: DateTime,
}

impl Like {
    pub fn new(thread: ObjectId, user: ObjectId) -> Self {
        Self {
            id: None,
            thread,
            user,
            created_at: DateTime::now(),
        }
    }
}
