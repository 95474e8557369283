//! Remote procedures run on individual nodes during bootstrap

pub mod images;
pub mod init;
pub mod join;
pub mod network;
pub mod preflight;
pub mod ready;
pub mod reset;
pub mod slb;
pub mod system;
pub mod token;

pub use token::{extract_token, from_init_output};
