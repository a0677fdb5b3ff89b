pub mod ensure;

pub use ensure::{ArtifactKind, VersionArtifacts, VersionEnsurer, CLIENT_VERSION_ID, RELEASES_BASE};
