use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Thread {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub text: String,
    pub author: ObjectId,
    #[serde(default)]
    pub community: Option<ObjectId>,
    #[serde(default)]
    pub parent_id: Option<ObjectId>, // null for root posts
    #[serde(default)]
    pub children: Vec<ObjectId>, // direct replies in the order they were made
    pub created_at: DateTime,
}

impl Thread {
    pub fn new(text: String, author: ObjectId, parent_id: Option<ObjectId>) -> Self {
        Self {
            id: None,
            text,
            author,
            community: None,
            parent_id,
            children: vec![],
            created_at: DateTime::now(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
