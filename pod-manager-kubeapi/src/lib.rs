use std::fmt::Debug;

use kube::api;
use pod_manager_ext as k8s;

use k8s::corev1;
use k8s::Selection;
use k8s::SelectorError;

pub use error::Error;
pub use error::Result;
pub use options::ListOptions;
pub use options::OBJECT_NAMESPACE_FIELD;
pub use options::OBJECT_NAME_FIELD;

mod error;
mod options;

/// The Pod calls the pod manager is built on.
///
/// Every call is a live round trip to whatever backs the implementation;
/// implementations must not cache.
#[async_trait::async_trait]
pub trait PodClient: Send + Sync {
    /// Fetch a single Pod; fails with [`Error::NotFound`] when it does not exist.
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<corev1::Pod>;

    async fn list_pods(&self, options: &ListOptions) -> Result<Vec<corev1::Pod>>;

    /// Replace a Pod with optimistic concurrency.
    ///
    /// The write carries `pod.metadata.resource_version`; a stale version is
    /// rejected with [`Error::Conflict`].
    async fn replace_pod(&self, pod: &corev1::Pod) -> Result<corev1::Pod>;
}

pub struct KubeApi {
    post_params: api::PostParams,
    list_params: api::ListParams,
    client: kube::Client,
}

impl KubeApi {
    /// Create a KubeApi configured with a default Kubernetes client.
    ///
    /// The client is inferred from the environment: in-cluster service
    /// account first, then the local kubeconfig.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), kube::Error> {
    /// let api = pod_manager_kubeapi::KubeApi::new().await?;
    /// // use `api`...
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new() -> kube::Result<Self> {
        kube::Client::try_default().await.map(Self::with_client)
    }

    /// Create a KubeApi backed by the provided Kubernetes client.
    ///
    /// The returned KubeApi is initialized with default `PostParams` and `ListParams`
    /// and uses `client` for all Kubernetes interactions.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = kube::Client::try_default().await?;
    /// let api = pod_manager_kubeapi::KubeApi::with_client(client);
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_client(client: kube::Client) -> Self {
        Self {
            post_params: api::PostParams::default(),
            list_params: api::ListParams::default(),
            client,
        }
    }

    /// Get an Api handle for Pods, scoped to `namespace` or cluster-wide.
    fn pods(&self, namespace: Option<&str>) -> api::Api<corev1::Pod> {
        let client = self.client.clone();
        match namespace {
            Some(namespace) => api::Api::namespaced(client, namespace),
            None => api::Api::all(client),
        }
    }

    fn post_params(&self) -> &api::PostParams {
        &self.post_params
    }

    fn list_params(&self) -> &api::ListParams {
        &self.list_params
    }
}

#[async_trait::async_trait]
impl PodClient for KubeApi {
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<corev1::Pod> {
        tracing::debug!(namespace, name, "Getting pod");
        self.pods(Some(namespace))
            .get(name)
            .await
            .map_err(|err| Error::from_pod_error(err, namespace, name))
    }

    async fn list_pods(&self, options: &ListOptions) -> Result<Vec<corev1::Pod>> {
        if options.selects_nothing() {
            return Ok(Vec::new());
        }

        let lp = options.list_params(self.list_params());
        tracing::debug!(
            namespace = ?options.namespace(),
            labels = ?lp.label_selector,
            fields = ?lp.field_selector,
            "Listing pods"
        );
        let list = self.pods(options.namespace()).list(&lp).await?;
        Ok(list.items)
    }

    async fn replace_pod(&self, pod: &corev1::Pod) -> Result<corev1::Pod> {
        let namespace = pod
            .metadata
            .namespace
            .as_deref()
            .ok_or(Error::MissingMetadata("namespace"))?;
        let name = pod
            .metadata
            .name
            .as_deref()
            .ok_or(Error::MissingMetadata("name"))?;
        tracing::debug!(
            namespace,
            name,
            resource_version = ?pod.metadata.resource_version,
            "Replacing pod"
        );
        self.pods(Some(namespace))
            .replace(name, self.post_params(), pod)
            .await
            .map_err(|err| Error::from_pod_error(err, namespace, name))
    }
}

impl Debug for KubeApi {
    /// Formats the `KubeApi` for debugging, showing `post_params` and `list_params` while redacting the `client`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeApi")
            .field("post_params", &self.post_params)
            .field("list_params", &self.list_params)
            .field("client", &"<kube::Client>")
            .finish()
    }
}
