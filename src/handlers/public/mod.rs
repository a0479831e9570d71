pub mod health;
pub mod home;

pub use health::healthz;
pub use home::home;
