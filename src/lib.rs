// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod audio;
pub mod config;
pub mod content;
pub mod effects;
pub mod engine;
pub mod history;
pub mod runtime;
pub mod session;
pub mod util;
pub mod voice;
