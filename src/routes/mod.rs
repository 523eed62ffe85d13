mod auth;
mod cookies;
mod health_check;
mod response;
mod users;

pub use auth::{change_password, login, logout, refresh, register};
pub use health_check::health_check;
pub use response::ApiResponse;
pub use users::{current_user, update_account, update_avatar, update_cover_image};
