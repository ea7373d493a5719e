pub mod detection;
pub mod loader;
pub mod store;
pub mod watcher;
pub use detection::DetectionConfig;
pub use loader::*;
pub use store::ConfigStore;
pub use watcher::ConfigWatcher;
pub use watcher::reload_config;
