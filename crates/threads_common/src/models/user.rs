use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// A profile keyed by the identity provider's user id. Liked threads are not
/// stored here, they are read from the `likes` collection.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub external_id: String, // id issued by the identity provider
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub onboarded: bool,
    #[serde(default)]
    pub threads: Vec<ObjectId>, // root threads authored by this user, oldest first
    #[serde(default)]
    pub communities: Vec<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Fields written by a profile edit
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserProfile {
    pub external_id: String,
    pub username: String,
    pub name: String,
    pub bio: Option<String>,
    pub image: Option<String>,
}
