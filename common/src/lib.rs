pub mod allocator;
pub mod config;
pub mod error;
pub mod init;
pub mod version;
