pub mod auth;
pub mod files;
mod pages;
pub mod process;
