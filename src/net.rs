pub mod error;
pub mod mime;
pub mod cookie;
pub mod layer;

pub mod fs;
