pub mod commands;
// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;
pub mod server;

// Re-export commonly used handler functions for convenience
pub use handlers::{exit_code, expand_path, handle_crawl, handle_serve};

pub use server::{AppState, create_app};
