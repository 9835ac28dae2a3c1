#![forbid(unsafe_code)]

mod app;
pub mod download;
mod error;
mod pages;
pub mod upload;

pub use app::{AppState, router, serve};
pub use error::HttpError;
