use serde::{Serialize, Deserialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct LogInfo {
    pub kind: String,
    pub name: String,
    pub description: String,
}
