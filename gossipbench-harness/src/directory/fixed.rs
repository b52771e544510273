use super::{Directory, DiscoveryError, Selector};
use async_trait::async_trait;
use gossipbench::Address;

/// A static directory which always returns the
/// configured addresses, e.g. for bare metal
/// clusters or local runs w/o a k8s api
pub struct StaticDirectory {
    entries: Vec<String>,
}

impl StaticDirectory {
    /// Entries are `host`, `host:port` or `http://host:port`
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn resolve(&self, selector: &Selector) -> Result<Vec<Address>, DiscoveryError> {
        // The selector's namespace and labels mean nothing here,
        // only its port is used as the default
        self.entries
            .iter()
            .map(|entry| {
                Address::parse_with_default_port(entry, selector.port)
                    .map_err(DiscoveryError::InvalidAddress)
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_port_applies() {
        let directory = StaticDirectory::new(["http://192.168.3.11:8000", "192.168.3.12", "node:9000"]);
        let selector = Selector {
            port: 7000,
            ..Selector::default()
        };

        let addresses = directory.resolve(&selector).await.unwrap();
        assert_eq!(
            addresses,
            vec![
                Address::new("192.168.3.11", 8000),
                Address::new("192.168.3.12", 7000),
                Address::new("node", 9000),
            ]
        );
    }

    #[test]
    fn test_invalid_entry_fails_resolution() {
        let directory = StaticDirectory::new(["10.0.0.1", "10.0.0.2:port"]);
        let err = tokio_test::block_on(directory.resolve(&Selector::default())).unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidAddress(_)));
    }
}
