use std::path::PathBuf;
use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Session {
    pub secure: Option<bool>,
    pub idle: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Admin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Sec {
    pub session: Option<Session>,
    pub admin: Option<Admin>,
}

#[derive(Debug, Deserialize)]
pub struct Uploads {
    pub directory: Option<PathBuf>,
    pub allowed_extensions: Option<Vec<String>>,
    pub max_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Feedback {
    pub cooldown: Option<Vec<u64>>,
}

#[derive(Debug, Deserialize)]
pub struct Listener {
    pub addr: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub share: Option<PathBuf>,
    pub trash: Option<PathBuf>,
    pub data: Option<PathBuf>,
    pub logs: Option<PathBuf>,
    pub tmp: Option<PathBuf>,
    pub assets: Option<PathBuf>,
    pub master_key: Option<String>,
    pub timeout: Option<u64>,

    pub listeners: Option<HashMap<String, Listener>>,

    pub uploads: Option<Uploads>,
    pub feedback: Option<Feedback>,

    pub sec: Option<Sec>,
}
