use std::net::SocketAddr;
use std::time::Duration;

/// How long [`Server::stop`](crate::Server::stop) waits for in-flight requests before
/// aborting them.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Largest form body read into memory for parameter binding.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Settings assembled by [`ServerBuilder`](crate::ServerBuilder).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: Vec<SocketAddr>,
    pub shutdown_grace: Duration,
    pub max_body_size: usize,
}

impl ServerConfig {
    pub fn new(address: Vec<SocketAddr>) -> Self {
        Self { address, shutdown_grace: DEFAULT_SHUTDOWN_GRACE, max_body_size: DEFAULT_MAX_BODY_SIZE }
    }
}
