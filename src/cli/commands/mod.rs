//! CLI command implementations

pub mod init;
pub mod process;
pub mod review;
pub mod scan;
pub mod validate;
