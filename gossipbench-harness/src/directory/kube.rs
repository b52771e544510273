use super::{Directory, DiscoveryError, Selector};
use async_trait::async_trait;
use gossipbench::Address;
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client as KubeClient, api::ListParams};

/// Discovers gossip nodes by listing pods
/// through the k8s api
pub struct KubeDirectory {
    client: KubeClient,
}

impl KubeDirectory {
    /// Connect using in-cluster config or the local kubeconfig
    pub async fn connect() -> Result<Self, DiscoveryError> {
        let client = KubeClient::try_default()
            .await
            .map_err(DiscoveryError::Client)?;
        Ok(Self { client })
    }

    pub fn with_client(client: KubeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Directory for KubeDirectory {
    async fn resolve(&self, selector: &Selector) -> Result<Vec<Address>, DiscoveryError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &selector.namespace);

        let mut list_params = ListParams::default();
        if !selector.label_selector.is_empty() {
            list_params = list_params.labels(&selector.label_selector);
        }

        tracing::debug!(
            "Listing pods in namespace {} with selector {:?}",
            selector.namespace,
            selector.label_selector
        );

        let pods = pods
            .list(&list_params)
            .await
            .map_err(|source| DiscoveryError::List {
                namespace: selector.namespace.clone(),
                source,
            })?;

        Ok(addresses_from_pods(&pods.items, selector.port))
    }

    fn name(&self) -> &'static str {
        "kube"
    }
}

/// Pod IPs in listing order; pods that have not been assigned an IP yet are skipped
pub(crate) fn addresses_from_pods(pods: &[Pod], port: u16) -> Vec<Address> {
    pods.iter()
        .filter_map(|pod| {
            let ip = pod.status.as_ref().and_then(|s| s.pod_ip.as_deref());
            match ip {
                Some(ip) if !ip.is_empty() => Some(Address::new(ip, port)),
                _ => {
                    tracing::debug!(
                        "Skipping pod {} without an IP",
                        pod.metadata.name.as_deref().unwrap_or("<unnamed>")
                    );
                    None
                }
            }
        })
        .collect()
}
