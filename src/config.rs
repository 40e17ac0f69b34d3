use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: IpAddr,
    pub server_port: u16,
    pub environment: Environment,
    pub log_level: String,
    pub frontend_url: String,
    /// Directory of client assets to serve, if any.
    pub static_dir: Option<PathBuf>,
    /// Seconds between idle-room sweeps.
    pub reaper_interval_secs: u64,
    /// Seconds of member inactivity before a room is considered stale.
    pub room_stale_secs: u64,
}

/// Deployment environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional with defaults: `SERVER_HOST`, `SERVER_PORT`,
    /// `ENVIRONMENT`, `LOG_LEVEL`, `FRONTEND_URL`, `STATIC_DIR`,
    /// `REAPER_INTERVAL_SECS`, `ROOM_STALE_SECS`.
    ///
    /// On Railway, `PORT` overrides `SERVER_PORT` and host defaults to `0.0.0.0`.
    ///
    /// # Errors
    ///
    /// Returns an error if `SERVER_HOST`, `SERVER_PORT` / `PORT`, or the
    /// reaper timing variables contain invalid values.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let environment = match std::env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .as_str()
        {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        // Railway provides PORT; fall back to SERVER_PORT, then 3000
        let server_port = std::env::var("PORT")
            .or_else(|_| std::env::var("SERVER_PORT"))
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| anyhow::anyhow!("SERVER_PORT / PORT must be a valid u16"))?;

        // In production, default to 0.0.0.0 so Railway can route traffic
        let default_host = if environment == Environment::Production {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };

        let server_host = std::env::var("SERVER_HOST")
            .unwrap_or_else(|_| default_host.to_string())
            .parse::<IpAddr>()
            .map_err(|_| anyhow::anyhow!("SERVER_HOST must be a valid IP address"))?;

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());

        let static_dir = std::env::var("STATIC_DIR").ok().map(PathBuf::from);

        let reaper_interval_secs = parse_secs("REAPER_INTERVAL_SECS", 300)?;
        let room_stale_secs = parse_secs("ROOM_STALE_SECS", 1800)?;

        Ok(Self {
            server_host,
            server_port,
            environment,
            log_level,
            frontend_url,
            static_dir,
            reaper_interval_secs,
            room_stale_secs,
        })
    }

    /// Build the socket address for the server to bind to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_host, self.server_port)
    }

    /// How often the idle reaper runs.
    #[must_use]
    pub const fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.reaper_interval_secs)
    }

    /// Inactivity window after which a room is eligible for reaping.
    #[must_use]
    pub const fn room_stale_after(&self) -> Duration {
        Duration::from_secs(self.room_stale_secs)
    }
}

fn parse_secs(var: &str, default: u64) -> anyhow::Result<u64> {
    std::env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u64>()
        .map_err(|_| anyhow::anyhow!("{var} must be a number of seconds"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server_host: IpAddr::from([127, 0, 0, 1]),
            server_port: 3000,
            environment: Environment::Development,
            log_level: "info".to_string(),
            frontend_url: "http://localhost:3001".to_string(),
            static_dir: None,
            reaper_interval_secs: 300,
            room_stale_secs: 1800,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_reaper_durations() {
        let config = test_config();
        assert_eq!(config.reaper_interval(), Duration::from_secs(300));
        assert_eq!(config.room_stale_after(), Duration::from_secs(1800));
    }
}
