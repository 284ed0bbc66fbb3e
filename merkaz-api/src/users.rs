use merkaz_lib::users::{Role, Status};
use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub email: String,
    pub role: Role,
    pub status: Status,
}
