pub mod commands;
pub mod config;
pub mod counter;
pub mod error;
pub mod guild;
pub mod handler;
pub mod keepalive;
pub mod panel;
pub mod payload;
pub mod rules;
pub mod ticket;

/// Initialises `env_logger` at `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();
}
