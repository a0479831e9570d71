pub mod tab_service;
pub mod user_service;

pub use tab_service::TabService;
pub use user_service::UserService;
