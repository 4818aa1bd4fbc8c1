use std::collections::BTreeMap;

use kube::ResourceExt as _;
use pod_manager_ext as k8s;
use pod_manager_kubeapi::KubeApi;

use k8s::corev1;
use k8s::metav1;
use k8s::LabelSelectorExt as _;

pub use config::parse_duration;
pub use config::PodManagerConfig;
pub use error::Error;
pub use error::Result;
pub use pod_manager_kubeapi::ListOptions;
pub use pod_manager_kubeapi::PodClient;

mod config;
mod error;

/// Pod accessors over a [`PodClient`].
///
/// Holds no Pod state of its own: every call is a live round trip through
/// the client.
#[derive(Debug)]
pub struct PodManager<C = KubeApi> {
    config: PodManagerConfig,
    client: C,
}

impl PodManager {
    /// Create a PodManager over the default Kubernetes client, configured
    /// from the environment (see [`PodManagerConfig::from_env`]).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run() -> pod_manager::Result<()> {
    /// let manager = pod_manager::PodManager::try_default().await?;
    /// let pod = manager.get_pod_by_name("default", "web-0").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn try_default() -> Result<Self> {
        let config = PodManagerConfig::from_env()?;
        let client = KubeApi::new().await?;
        Ok(Self::new(config, client))
    }
}

impl<C> PodManager<C>
where
    C: PodClient,
{
    pub fn new(config: PodManagerConfig, client: C) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &PodManagerConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch the Pod `namespace/name` as stored; absent Pods are a not-found error.
    pub async fn get_pod_by_name(&self, namespace: &str, name: &str) -> Result<corev1::Pod> {
        let pod = self.client.get_pod(namespace, name).await?;
        Ok(pod)
    }

    pub async fn list_pods(&self, options: &ListOptions) -> Result<Vec<corev1::Pod>> {
        let pods = self.client.list_pods(options).await?;
        Ok(pods)
    }

    /// Checks whether the Pod `namespace/name` carries labels matching `selector`.
    ///
    /// An absent Pod or an absent selector is a plain `false`. A malformed
    /// selector is only reported once the Pod is known to exist.
    pub async fn match_label_selector(
        &self,
        namespace: &str,
        name: &str,
        selector: Option<&metav1::LabelSelector>,
    ) -> Result<bool> {
        let options = ListOptions::new()
            .in_namespace(namespace)
            .matching_name(name);
        let pods = self.list_pods(&options).await?;
        let Some(pod) = pods.first() else {
            tracing::debug!(namespace, name, "Pod not found, nothing to match");
            return Ok(false);
        };

        let selector = selector.to_selector()?;
        let matched = selector.matches(pod.labels());
        tracing::debug!(namespace, name, ?selector, matched, "Matched label selector");
        Ok(matched)
    }

    /// Merges `annotations` into the Pod `namespace/name`, new values winning.
    ///
    /// Each attempt re-reads the Pod and replaces it at the version it read.
    /// Conflicting writes are retried up to `max_conflict_retries` times with
    /// a randomized backoff; any other error is returned as is.
    ///
    /// When every annotation is already present with the same value the Pod
    /// is left untouched and no replace is issued, so replace failures are
    /// only surfaced for merges that change something.
    pub async fn merge_annotations(
        &self,
        namespace: &str,
        name: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Result<()> {
        if annotations.is_empty() {
            return Ok(());
        }

        let retries = self.config.max_conflict_retries;
        for attempt in 0..=retries {
            let mut pod = self.get_pod_by_name(namespace, name).await?;
            if !k8s::merge_string_map(pod.annotations_mut(), annotations) {
                tracing::debug!(namespace, name, "Annotations already present");
                return Ok(());
            }

            match self.client.replace_pod(&pod).await {
                Ok(_) => {
                    tracing::debug!(namespace, name, attempt, "Merged annotations");
                    return Ok(());
                }
                Err(err) if err.is_conflict() && attempt < retries => {
                    let backoff = self.config.conflict_backoff(attempt);
                    tracing::warn!(
                        namespace,
                        name,
                        attempt,
                        ?backoff,
                        "Conflict merging annotations, retrying"
                    );
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                }
                Err(err) if err.is_conflict() => {
                    tracing::error!(
                        namespace,
                        name,
                        retries,
                        ?err,
                        "Out of retries merging annotations"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(Error::RetriesExhausted {
            namespace: namespace.to_string(),
            name: name.to_string(),
            retries,
        })
    }
}

#[cfg(test)]
mod fake;
