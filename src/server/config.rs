use clap::Parser;
use std::net::SocketAddr;

/// Configuration for the office-service HTTP server.
#[derive(Parser, Debug, Clone)]
#[command(name = "office-service")]
#[command(about = "Create and edit Word, Excel and PowerPoint files over HTTP", version)]
pub struct Config {
    /// TCP host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "OFFICE_SERVICE_HOST")]
    pub host: String,

    /// TCP port to bind to
    #[arg(long, default_value = "8007", env = "OFFICE_SERVICE_PORT")]
    pub port: u16,
}

impl Config {
    /// `host:port` as a bind address string.
    pub fn bind_addr(&self) -> String {
        match self.host.parse::<std::net::IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.port).to_string(),
            Err(_) => format!("{}:{}", self.host, self.port),
        }
    }
}
