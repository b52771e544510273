//! Target addresses and the sampling pool
//!
//! An [`Address`] is one reachable gossip node. A [`Pool`] is the read-only
//! set of addresses a dispatch run samples from; it is never empty.

use crate::core::ConfigError;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// A reachable node endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    host: String,
    port: u16,
}

impl Address {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host`, `host:port`, `[v6]:port` or any of those behind an
    /// `http://` prefix; a missing port falls back to `default_port`
    ///
    /// # Example
    ///
    /// ```
    /// use gossipbench::Address;
    ///
    /// let addr = Address::parse_with_default_port("http://10.1.2.3", 8000).unwrap();
    /// assert_eq!(addr.to_string(), "10.1.2.3:8000");
    ///
    /// let addr = Address::parse_with_default_port("node-1:9000", 8000).unwrap();
    /// assert_eq!(addr.port(), 9000);
    /// ```
    pub fn parse_with_default_port(s: &str, default_port: u16) -> Result<Self, ConfigError> {
        let (host, port) = split_host_port(s)?;
        Ok(Self::new(host, port.unwrap_or(default_port)))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `http://host:port`
    pub fn base_url(&self) -> String {
        format!("http://{self}")
    }

    /// Absolute URL of `path` on this node
    pub fn url(&self, path: &str) -> String {
        format!("http://{self}{path}")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Address {
    type Err = ConfigError;

    /// Parses `host:port`; the port is required
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match split_host_port(s)? {
            (host, Some(port)) => Ok(Self::new(host, port)),
            (_, None) => Err(ConfigError::InvalidAddress(s.to_string())),
        }
    }
}

/// Split an address into its host and explicit port, if any
fn split_host_port(s: &str) -> Result<(&str, Option<u16>), ConfigError> {
    let invalid = || ConfigError::InvalidAddress(s.to_string());

    let trimmed = s.trim();
    let rest = trimmed.strip_prefix("http://").unwrap_or(trimmed);
    let rest = rest.trim_end_matches('/');
    if rest.is_empty() || rest.contains('/') {
        return Err(invalid());
    }

    // Bracketed IPv6, with or without a port
    if let Some(inner) = rest.strip_prefix('[') {
        let (host, tail) = inner.split_once(']').ok_or_else(invalid)?;
        let port = match tail {
            "" => None,
            tail => Some(
                tail.strip_prefix(':')
                    .and_then(|p| p.parse().ok())
                    .ok_or_else(invalid)?,
            ),
        };
        return Ok((host, port));
    }

    match rest.rsplit_once(':') {
        // More than one colon without brackets: a bare IPv6 host
        Some((host, _)) if host.contains(':') => Ok((rest, None)),
        Some((host, port)) if !host.is_empty() => {
            let port = port.parse().map_err(|_| invalid())?;
            Ok((host, Some(port)))
        }
        Some(_) => Err(invalid()),
        None => Ok((rest, None)),
    }
}

/// The non-empty set of addresses sampled during one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    addresses: Vec<Address>,
}

impl Pool {
    /// Build a pool, rejecting an empty address list
    pub fn new(addresses: Vec<Address>) -> Result<Self, ConfigError> {
        if addresses.is_empty() {
            return Err(ConfigError::EmptyPool);
        }
        Ok(Self { addresses })
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Address> {
        self.addresses.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Address> {
        self.addresses.get(index)
    }

    pub fn first(&self) -> &Address {
        &self.addresses[0]
    }

    /// A pool containing only the first address
    pub fn first_only(&self) -> Pool {
        Pool {
            addresses: vec![self.first().clone()],
        }
    }

    /// Uniformly pick an index using the given RNG
    pub fn sample_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.addresses.len())
    }

    /// Uniformly pick an address using the thread-local RNG
    pub fn sample(&self) -> (usize, &Address) {
        let index = self.sample_index(&mut rand::thread_rng());
        (index, &self.addresses[index])
    }
}

impl<'a> IntoIterator for &'a Pool {
    type Item = &'a Address;
    type IntoIter = std::slice::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.addresses.iter()
    }
}
