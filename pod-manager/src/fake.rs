use std::sync::Mutex;

use kube::ResourceExt as _;
use pod_manager_kubeapi as kubeapi;

use kubeapi::OBJECT_NAMESPACE_FIELD;
use kubeapi::OBJECT_NAME_FIELD;

use super::*;

type Key = (String, String);

/// In-memory Pod store with API server write semantics: resource versions
/// are bumped on every write and stale replaces are rejected with 409.
#[derive(Debug, Default)]
pub(crate) struct FakeClient {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    pods: BTreeMap<Key, corev1::Pod>,
    resource_version: u64,
    list_failure: Option<u16>,
    replace_failure: Option<u16>,
    interference: Vec<BTreeMap<String, String>>,
    get_calls: usize,
    list_calls: usize,
    replace_calls: usize,
}

impl State {
    fn next_resource_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }

    fn store(&mut self, mut pod: corev1::Pod) -> corev1::Pod {
        pod.metadata.resource_version = Some(self.next_resource_version());
        self.pods.insert(key(&pod), pod.clone());
        pod
    }
}

impl FakeClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn create(&self, pod: corev1::Pod) -> corev1::Pod {
        self.state().store(pod)
    }

    pub(crate) fn stored(&self, namespace: &str, name: &str) -> Option<corev1::Pod> {
        let state = self.state();
        state
            .pods
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Every list call fails with an API error carrying `code`.
    pub(crate) fn fail_lists_with(&self, code: u16) {
        self.state().list_failure = Some(code);
    }

    /// Every replace call fails with an API error carrying `code`.
    pub(crate) fn fail_replaces_with(&self, code: u16) {
        self.state().replace_failure = Some(code);
    }

    /// The next `times` replaces race with another writer that lands
    /// `annotations` first, so each of them hits a stale resource version.
    pub(crate) fn interfere_with_replaces(
        &self,
        times: usize,
        annotations: impl IntoIterator<Item = (impl ToString, impl ToString)>,
    ) {
        let annotations = annotations
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<BTreeMap<_, _>>();
        self.state().interference = vec![annotations; times];
    }

    pub(crate) fn get_calls(&self) -> usize {
        self.state().get_calls
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.state().list_calls
    }

    pub(crate) fn replace_calls(&self) -> usize {
        self.state().replace_calls
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl PodClient for FakeClient {
    async fn get_pod(&self, namespace: &str, name: &str) -> kubeapi::Result<corev1::Pod> {
        let mut state = self.state();
        state.get_calls += 1;
        let key = (namespace.to_string(), name.to_string());
        state
            .pods
            .get(&key)
            .cloned()
            .ok_or_else(|| kubeapi::Error::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn list_pods(&self, options: &ListOptions) -> kubeapi::Result<Vec<corev1::Pod>> {
        let mut state = self.state();
        state.list_calls += 1;
        if let Some(code) = state.list_failure {
            return Err(api_error(code));
        }

        let mut pods = Vec::new();
        for pod in state.pods.values() {
            if options.namespace().is_some_and(|ns| pod.namespace().as_deref() != Some(ns)) {
                continue;
            }
            if options
                .label_selector()
                .is_some_and(|selector| !selector.matches(pod.labels()))
            {
                continue;
            }
            if !matches_fields(pod, options)? {
                continue;
            }
            pods.push(pod.clone());
        }

        if let Some(limit) = options.limit() {
            pods.truncate(limit as usize);
        }
        Ok(pods)
    }

    async fn replace_pod(&self, pod: &corev1::Pod) -> kubeapi::Result<corev1::Pod> {
        let mut state = self.state();
        state.replace_calls += 1;
        if let Some(code) = state.replace_failure {
            return Err(api_error(code));
        }

        let key = key(pod);
        if let Some(annotations) = state.interference.pop() {
            if let Some(mut current) = state.pods.get(&key).cloned() {
                k8s::merge_string_map(current.annotations_mut(), &annotations);
                state.store(current);
            }
        }

        let (namespace, name) = key;
        let Some(current) = state.pods.get(&(namespace.clone(), name.clone())) else {
            return Err(kubeapi::Error::NotFound { namespace, name });
        };
        if current.metadata.resource_version != pod.metadata.resource_version {
            return Err(kubeapi::Error::Conflict {
                namespace,
                name,
                message: "the object has been modified; please apply your changes to the latest version and try again".to_string(),
            });
        }

        Ok(state.store(pod.clone()))
    }
}

fn key(pod: &corev1::Pod) -> Key {
    (pod.namespace().unwrap_or_default(), pod.name_any())
}

fn matches_fields(pod: &corev1::Pod, options: &ListOptions) -> kubeapi::Result<bool> {
    for (field, value) in options.field_selector() {
        let actual = match field.as_str() {
            OBJECT_NAME_FIELD => pod.metadata.name.as_deref(),
            OBJECT_NAMESPACE_FIELD => pod.metadata.namespace.as_deref(),
            _ => {
                return Err(kubeapi::Error::Api {
                    code: 400,
                    reason: "BadRequest".to_string(),
                    message: format!("field label not supported: {field}"),
                })
            }
        };
        if actual != Some(value.as_str()) {
            return Ok(false);
        }
    }
    Ok(true)
}

fn api_error(code: u16) -> kubeapi::Error {
    kubeapi::Error::Api {
        code,
        reason: "InternalError".to_string(),
        message: "unknown error".to_string(),
    }
}
