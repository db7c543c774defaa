pub mod config;
pub mod pacing;
pub mod scene;
pub mod util;

pub use config::DemoConfig;
pub use pacing::FramePacer;
pub use scene::Dial;
