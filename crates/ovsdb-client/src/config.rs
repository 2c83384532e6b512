//! Client configuration
//!
//! The server address uses the `ovs-vsctl` style `tcp:<host>:<port>` or
//! `unix:<path>`. [`ClientConfig::from_env`] reads:
//!
//! - `OVSDB_ADDRESS`: server address (default: the local ovsdb-server socket)
//! - `OVSDB_KEEPALIVE_SECS`: interval of client-initiated `echo` requests;
//!   unset or `0` disables them

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use ovsdb_core::{Error, Result};

/// Candidate ovsdb-server sockets, in order of preference
pub const DEFAULT_SOCKET_PATHS: &[&str] = &["/var/run/openvswitch/db.sock", "/run/openvswitch/db.sock"];

pub const ADDRESS_ENV: &str = "OVSDB_ADDRESS";
pub const KEEPALIVE_ENV: &str = "OVSDB_KEEPALIVE_SECS";

/// Where the OVSDB server listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Tcp(String),
    Unix(PathBuf),
}

impl Address {
    /// The first default socket that exists, else the primary default
    pub fn local() -> Self {
        let path = DEFAULT_SOCKET_PATHS
            .iter()
            .find(|p| Path::new(p).exists())
            .unwrap_or(&DEFAULT_SOCKET_PATHS[0]);
        Address::Unix(PathBuf::from(path))
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::local()
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (protocol, target) = s
            .split_once(':')
            .ok_or_else(|| Error::connection(format!("invalid address: {:?}", s)))?;
        if target.is_empty() {
            return Err(Error::connection(format!("invalid address: {:?}", s)));
        }
        match protocol {
            "tcp" => Ok(Address::Tcp(target.to_string())),
            "unix" => Ok(Address::Unix(PathBuf::from(target))),
            other => Err(Error::connection(format!("unknown protocol: {:?}", other))),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Tcp(addr) => write!(f, "tcp:{}", addr),
            Address::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

/// Configuration for a [`Session`](crate::Session)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub address: Address,
    /// Send an `echo` request this often while the session is open
    pub keepalive: Option<Duration>,
}

impl ClientConfig {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            keepalive: None,
        }
    }

    pub fn with_keepalive(mut self, interval: Duration) -> Self {
        self.keepalive = Some(interval);
        self
    }

    /// Build the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_values(get_config_opt(ADDRESS_ENV), get_config_opt(KEEPALIVE_ENV))
    }

    fn from_values(address: Option<String>, keepalive: Option<String>) -> Result<Self> {
        let address = match address {
            Some(addr) => addr.parse()?,
            None => Address::local(),
        };
        let keepalive = match keepalive {
            Some(secs) => {
                let secs: u64 = secs
                    .parse()
                    .map_err(|_| Error::connection(format!("invalid {}: {:?}", KEEPALIVE_ENV, secs)))?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };
        debug!("OVSDB client config: address={}, keepalive={:?}", address, keepalive);
        Ok(Self { address, keepalive })
    }
}

/// Get an optional configuration value; empty counts as unset.
pub fn get_config_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
