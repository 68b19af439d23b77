use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

// Not read or written by any action yet, only indexed
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Community {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub external_id: String,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub created_by: Option<ObjectId>,
    #[serde(default)]
    pub threads: Vec<ObjectId>,
    #[serde(default)]
    pub members: Vec<ObjectId>,
}
