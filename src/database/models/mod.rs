pub mod tab;
pub mod user;

pub use tab::Tab;
pub use user::User;
