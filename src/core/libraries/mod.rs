pub mod custom;
pub mod ensure;
pub mod manifest;
pub mod natives;
pub mod path;

pub use custom::{ensure_custom_resources, CustomResources};
pub use ensure::{DependencyEnsurer, EnsureReport};
pub use manifest::DependencyManifest;
pub use path::ResourcePath;
