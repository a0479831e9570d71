pub mod archive;
pub mod hook;

pub use archive::archive_get;
pub use hook::hook_post;
