use std::collections::BTreeMap;

use super::*;

pub const OBJECT_NAME_FIELD: &str = "metadata.name";
pub const OBJECT_NAMESPACE_FIELD: &str = "metadata.namespace";

/// Filters for a Pod list call.
///
/// All filters are AND-ed. A later label selector replaces an earlier one;
/// field requirements accumulate, a repeated field keeps the last value.
#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    namespace: Option<String>,
    label_selector: Option<Selection>,
    field_selector: BTreeMap<String, String>,
    limit: Option<u32>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_namespace(self, namespace: impl ToString) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            ..self
        }
    }

    pub fn matching_selector(self, selector: impl Into<Selection>) -> Self {
        Self {
            label_selector: Some(selector.into()),
            ..self
        }
    }

    /// Equality match on every given label.
    pub fn matching_labels(
        self,
        labels: impl IntoIterator<Item = (impl ToString, impl ToString)>,
    ) -> Result<Self, SelectorError> {
        Selection::from_labels(labels).map(|selector| self.matching_selector(selector))
    }

    pub fn matching_field(mut self, field: impl ToString, value: impl ToString) -> Self {
        self.field_selector
            .insert(field.to_string(), value.to_string());
        self
    }

    pub fn matching_name(self, name: impl ToString) -> Self {
        self.matching_field(OBJECT_NAME_FIELD, name)
    }

    pub fn with_limit(self, limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..self
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn label_selector(&self) -> Option<&Selection> {
        self.label_selector.as_ref()
    }

    pub fn field_selector(&self) -> &BTreeMap<String, String> {
        &self.field_selector
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// True when the label selector can never match, so listing is pointless.
    pub fn selects_nothing(&self) -> bool {
        self.label_selector
            .as_ref()
            .is_some_and(Selection::is_nothing)
    }

    /// Renders these options on top of `base`.
    pub fn list_params(&self, base: &api::ListParams) -> api::ListParams {
        let mut lp = base.clone();
        if let Some(selector) = self
            .label_selector
            .as_ref()
            .and_then(Selection::selector)
            .filter(|selector| !selector.selects_all())
        {
            lp = lp.labels_from(selector);
        }
        if let Some(fields) = self.field_selector_query() {
            lp.field_selector = Some(fields);
        }
        if let Some(limit) = self.limit {
            lp.limit = Some(limit);
        }
        lp
    }

    fn field_selector_query(&self) -> Option<String> {
        if self.field_selector.is_empty() {
            return None;
        }
        let query = self
            .field_selector
            .iter()
            .map(|(field, value)| format!("{field}={value}"))
            .collect::<Vec<_>>()
            .join(",");
        Some(query)
    }
}
