use anyhow::Context;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Settings for the HTTP gateway.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind; an IP address literal.
    pub host: String,
    pub port: u16,
    /// The JSON document served by `/api/data`.
    pub data_file: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            data_file: PathBuf::from(crate::store::DATA_FILE_NAME),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .trim()
            .parse()
            .with_context(|| format!("host must be an IP address, got {:?}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_listens_on_all_interfaces() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.socket_addr().expect("addr").to_string(), "0.0.0.0:3000");
        assert_eq!(cfg.data_file, PathBuf::from("database.json"));
    }

    #[test]
    fn hostnames_are_rejected() {
        let cfg = ServerConfig {
            host: "localhost".into(),
            ..ServerConfig::default()
        };
        assert!(cfg.socket_addr().is_err());
    }
}
