use serde::Deserialize;

pub mod move_to;
pub mod decline;

#[derive(Deserialize)]
pub struct PathParams {
    filename: String,
}
