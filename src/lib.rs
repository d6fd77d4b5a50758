// Library surface for headless/integration tests and reuse.
// The binary only wires terminal, clients, and the event loop together.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod form;
pub mod game;
pub mod loader;
pub mod logging;
pub mod question;
pub mod runtime;
pub mod summary;
#[cfg(test)]
mod testing;
pub mod timer;
pub mod translate;
pub mod trivia;
pub mod ui;
pub mod util;
