use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateThreadRequest {
    pub text: String,
    pub path: Option<String>, // view to revalidate once the thread exists
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AddCommentRequest {
    pub text: String,
    pub path: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LikeRequest {
    pub path: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdateUserRequest {
    pub username: String,
    pub name: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub path: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<SortOrder> {
        match value.to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Some(SortOrder::Asc),
            "desc" | "descending" | "-1" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    /// Mongo sort direction
    pub fn direction(&self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}
