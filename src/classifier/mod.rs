use crate::state::AppState;
use axum::Router;

pub mod conditions;
pub mod dto;
pub mod handlers;
pub mod model;
pub mod ops;
pub mod preprocess;
pub mod resolve;

pub use conditions::{CONDITIONS, DEFAULT_THRESHOLD};
pub use model::CxrModel;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
