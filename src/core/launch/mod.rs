pub mod classpath;
pub mod monitor;
pub mod task;

pub use classpath::{build_classpath, LeadingJars};
pub use monitor::{monitor, LaunchHandle};
pub use task::{
    build_launch_command, GameProcess, LaunchCommand, LaunchOptions, LaunchSpec, ProcessSpawner,
    TokioSpawner,
};
