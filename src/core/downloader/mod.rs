pub mod client;
pub mod resolver;

pub use client::{Downloader, Fetch};
pub use resolver::{Origins, SourceFallbackResolver};
