pub mod config;
pub mod console;
pub mod device_client;
pub mod http_client;
pub mod messages;
pub mod model;
pub mod reload;
pub mod render;
pub mod scheduler;
pub mod services;
pub mod types;
pub mod view;

#[cfg(test)]
mod testing;
