use super::path::ResourcePath;

/// Libraries of the 1.8.9 client, relative to a Maven-style repository.
const LIBRARY_PATHS: &[&str] = &[
    "com/mojang/netty/1.8.8/netty-1.8.8.jar",
    "oshi-project/oshi-core/1.1/oshi-core-1.1.jar",
    "net/java/dev/jna/jna/3.4.0/jna-3.4.0.jar",
    "net/java/dev/jna/platform/3.4.0/platform-3.4.0.jar",
    "com/ibm/icu/icu4j-core-mojang/51.2/icu4j-core-mojang-51.2.jar",
    "net/sf/jopt-simple/jopt-simple/4.6/jopt-simple-4.6.jar",
    "com/paulscode/codecjorbis/20101023/codecjorbis-20101023.jar",
    "com/paulscode/codecwav/20101023/codecwav-20101023.jar",
    "com/paulscode/libraryjavasound/20101123/libraryjavasound-20101123.jar",
    "com/paulscode/librarylwjglopenal/20100824/librarylwjglopenal-20100824.jar",
    "com/paulscode/soundsystem/20120107/soundsystem-20120107.jar",
    "io/netty/netty-all/4.0.23.Final/netty-all-4.0.23.Final.jar",
    "com/google/guava/guava/17.0/guava-17.0.jar",
    "org/apache/commons/commons-lang3/3.3.2/commons-lang3-3.3.2.jar",
    "commons-io/commons-io/2.4/commons-io-2.4.jar",
    "commons-codec/commons-codec/1.9/commons-codec-1.9.jar",
    "net/java/jinput/jinput/2.0.5/jinput-2.0.5.jar",
    "net/java/jutils/jutils/1.0.0/jutils-1.0.0.jar",
    "com/google/code/gson/gson/2.2.4/gson-2.2.4.jar",
    "com/mojang/authlib/1.5.21/authlib-1.5.21.jar",
    "com/mojang/realms/1.7.59/realms-1.7.59.jar",
    "org/apache/commons/commons-compress/1.8.1/commons-compress-1.8.1.jar",
    "org/apache/httpcomponents/httpclient/4.3.3/httpclient-4.3.3.jar",
    "commons-logging/commons-logging/1.1.3/commons-logging-1.1.3.jar",
    "org/apache/httpcomponents/httpcore/4.3.2/httpcore-4.3.2.jar",
    "org/apache/logging/log4j/log4j-api/2.0-beta9/log4j-api-2.0-beta9.jar",
    "org/apache/logging/log4j/log4j-core/2.0-beta9/log4j-core-2.0-beta9.jar",
    "org/lwjgl/lwjgl/lwjgl/2.9.4-nightly-20150209/lwjgl-2.9.4-nightly-20150209.jar",
    "org/lwjgl/lwjgl/lwjgl_util/2.9.4-nightly-20150209/lwjgl_util-2.9.4-nightly-20150209.jar",
    "org/lwjgl/lwjgl/lwjgl-platform/2.9.4-nightly-20150209/lwjgl-platform-2.9.4-nightly-20150209.jar",
    "org/lwjgl/lwjgl/lwjgl/2.9.2-nightly-20140822/lwjgl-2.9.2-nightly-20140822.jar",
    "org/lwjgl/lwjgl/lwjgl_util/2.9.2-nightly-20140822/lwjgl_util-2.9.2-nightly-20140822.jar",
    "tv/twitch/twitch/6.5/twitch-6.5.jar",
];

/// Archives whose contents are unpacked into the natives directory.
const NATIVE_ARCHIVES: &[&str] = &[
    "org/lwjgl/lwjgl/lwjgl-platform/2.9.4-nightly-20150209/lwjgl-platform-2.9.4-nightly-20150209-natives-windows.jar",
    "org/lwjgl/lwjgl/lwjgl-platform/2.9.2-nightly-20140822/lwjgl-platform-2.9.2-nightly-20140822-natives-windows.jar",
    "net/java/jinput/jinput-platform/2.0.5/jinput-platform-2.0.5-natives-windows.jar",
    "tv/twitch/twitch-platform/6.5/twitch-platform-6.5-natives-windows-64.jar",
    "tv/twitch/twitch-external-platform/4.5/twitch-external-platform-4.5-natives-windows-64.jar",
];

/// Required library artifacts, split by how they are used at launch.
#[derive(Debug, Clone, Default)]
pub struct DependencyManifest {
    /// Go on the classpath, in this order.
    pub libraries: Vec<ResourcePath>,
    /// Platform archives extracted into the natives directory.
    pub natives: Vec<ResourcePath>,
}

impl DependencyManifest {
    pub fn new<L, N>(libraries: L, natives: N) -> Self
    where
        L: IntoIterator,
        L::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        Self {
            libraries: normalized(libraries),
            natives: normalized(natives),
        }
    }

    /// The dependency set shipped with the client.
    pub fn builtin() -> Self {
        Self::new(LIBRARY_PATHS, NATIVE_ARCHIVES)
    }
}

/// Normalizes and de-duplicates while keeping first-seen order.
fn normalized<I>(raw: I) -> Vec<ResourcePath>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    raw.into_iter()
        .map(|entry| ResourcePath::new(entry.as_ref()))
        .filter(|path| !path.is_empty())
        .filter(|path| seen.insert(path.clone()))
        .collect()
}
