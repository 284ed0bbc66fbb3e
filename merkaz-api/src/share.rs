use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_folder: bool,
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Listing {
    pub current_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_path: Option<String>,
    pub items: Vec<DirectoryEntry>,
    pub cooldown_level: usize,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Trashed {
    pub name: String,
    pub original: String,
}
