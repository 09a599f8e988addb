//! Data Transfer Objects for REST request/response serialization.

pub mod common_dto;
pub mod content_dto;
pub mod engagement_dto;
pub mod item_dto;
pub mod session_dto;

pub use common_dto::*;
pub use content_dto::*;
pub use engagement_dto::*;
pub use item_dto::*;
pub use session_dto::*;
