pub mod file;
pub mod folder;
