pub use k8s_openapi as openapi;
pub use k8s_openapi::api::core::v1 as corev1;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;

pub use kube::core::Expression;
pub use kube::core::Selector;
pub use kube::core::SelectorExt;
pub use selector::LabelSelectorExt;
pub use selector::Selection;
pub use selector::SelectorError;

use std::collections::BTreeMap;

mod selector;

pub trait ObjectMetaExt {
    fn new(name: impl ToString) -> Self;
    fn with_namespace(name: impl ToString, namespace: impl ToString) -> Self;
    fn labels(self, labels: impl IntoIterator<Item = (impl ToString, impl ToString)>) -> Self;
    fn annotations(
        self,
        annotations: impl IntoIterator<Item = (impl ToString, impl ToString)>,
    ) -> Self;
}

impl ObjectMetaExt for metav1::ObjectMeta {
    fn new(name: impl ToString) -> Self {
        let name = Some(name.to_string());
        Self { name, ..default() }
    }

    fn with_namespace(name: impl ToString, namespace: impl ToString) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            ..Self::new(name)
        }
    }

    fn labels(self, labels: impl IntoIterator<Item = (impl ToString, impl ToString)>) -> Self {
        Self {
            labels: Some(string_map(labels)),
            ..self
        }
    }

    fn annotations(
        self,
        annotations: impl IntoIterator<Item = (impl ToString, impl ToString)>,
    ) -> Self {
        Self {
            annotations: Some(string_map(annotations)),
            ..self
        }
    }
}

pub trait PodExt {
    fn new(name: impl ToString, namespace: impl ToString) -> Self;
    fn with_metadata(metadata: metav1::ObjectMeta) -> Self;
}

impl PodExt for corev1::Pod {
    fn new(name: impl ToString, namespace: impl ToString) -> Self {
        Self::with_metadata(metav1::ObjectMeta::with_namespace(name, namespace))
    }

    fn with_metadata(metadata: metav1::ObjectMeta) -> Self {
        Self {
            metadata,
            spec: Some(default()),
            ..default()
        }
    }
}

/// Merges `overlay` into `base`; keys present in both take the overlay value.
///
/// Returns `true` when `base` changed.
pub fn merge_string_map(
    base: &mut BTreeMap<String, String>,
    overlay: &BTreeMap<String, String>,
) -> bool {
    let mut changed = false;
    for (key, value) in overlay {
        if base.get(key) != Some(value) {
            base.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    changed
}

fn string_map(
    items: impl IntoIterator<Item = (impl ToString, impl ToString)>,
) -> BTreeMap<String, String> {
    items
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub fn default<T: Default>() -> T {
    T::default()
}

#[cfg(test)]
mod tests;
