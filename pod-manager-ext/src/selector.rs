use std::collections::BTreeMap;

use super::*;

const MAX_NAME_LENGTH: usize = 63;
const MAX_PREFIX_LENGTH: usize = 253;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("invalid label key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("invalid label value {value:?} for key {key:?}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: &'static str,
    },

    #[error("{operator:?} is not a valid label selector operator (key {key:?})")]
    InvalidOperator { key: String, operator: String },

    #[error("values: must be specified for operator {operator} (key {key:?})")]
    ValuesRequired { key: String, operator: String },

    #[error("values: may not be specified for operator {operator} (key {key:?})")]
    ValuesForbidden { key: String, operator: String },

    #[error("invalid label selector: {0}")]
    Malformed(String),
}

/// A compiled label selector, or the absence of one.
///
/// An absent `LabelSelector` selects nothing, while an empty one selects
/// everything, so the two cannot share a representation.
#[derive(Clone, Debug)]
pub enum Selection {
    Nothing,
    Matching(Selector),
}

impl Selection {
    pub fn everything() -> Self {
        Self::Matching(Selector::default())
    }

    /// Equality selector over the given labels, the `matchLabels` shorthand.
    pub fn from_labels(
        labels: impl IntoIterator<Item = (impl ToString, impl ToString)>,
    ) -> Result<Self, SelectorError> {
        let labels = labels
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<BTreeMap<_, _>>();
        validate_match_labels(&labels)?;
        Ok(Self::Matching(labels.into_iter().collect()))
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Self::Nothing)
    }

    pub fn is_everything(&self) -> bool {
        matches!(self, Self::Matching(selector) if selector.selects_all())
    }

    pub fn selector(&self) -> Option<&Selector> {
        match self {
            Self::Nothing => None,
            Self::Matching(selector) => Some(selector),
        }
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Self::Nothing => false,
            Self::Matching(selector) => selector.matches(labels),
        }
    }
}

impl From<Selector> for Selection {
    fn from(selector: Selector) -> Self {
        Self::Matching(selector)
    }
}

pub trait LabelSelectorExt {
    fn to_selector(&self) -> Result<Selection, SelectorError>;
}

impl LabelSelectorExt for metav1::LabelSelector {
    fn to_selector(&self) -> Result<Selection, SelectorError> {
        validate_match_labels(self.match_labels.iter().flatten())?;
        for expr in self.match_expressions.iter().flatten() {
            validate_expression(expr)?;
        }

        Selector::try_from(self.clone())
            .map(Selection::Matching)
            .map_err(|err| SelectorError::Malformed(err.to_string()))
    }
}

impl LabelSelectorExt for Option<&metav1::LabelSelector> {
    fn to_selector(&self) -> Result<Selection, SelectorError> {
        self.map_or(Ok(Selection::Nothing), |selector| selector.to_selector())
    }
}

fn validate_match_labels<'a>(
    labels: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> Result<(), SelectorError> {
    for (key, value) in labels {
        validate_key(key)?;
        validate_value(key, value)?;
    }
    Ok(())
}

fn validate_expression(expr: &metav1::LabelSelectorRequirement) -> Result<(), SelectorError> {
    let key = &expr.key;
    let values = expr.values.as_deref().unwrap_or_default();

    validate_key(key)?;
    let error = match expr.operator.as_str() {
        "In" | "NotIn" if values.is_empty() => Some(SelectorError::ValuesRequired {
            key: key.clone(),
            operator: expr.operator.clone(),
        }),
        "Exists" | "DoesNotExist" if !values.is_empty() => Some(SelectorError::ValuesForbidden {
            key: key.clone(),
            operator: expr.operator.clone(),
        }),
        "In" | "NotIn" | "Exists" | "DoesNotExist" => None,
        _ => Some(SelectorError::InvalidOperator {
            key: key.clone(),
            operator: expr.operator.clone(),
        }),
    };
    if let Some(error) = error {
        return Err(error);
    }

    for value in values {
        validate_value(key, value)?;
    }
    Ok(())
}

fn validate_key(key: &str) -> Result<(), SelectorError> {
    let invalid = |reason| SelectorError::InvalidKey {
        key: key.to_string(),
        reason,
    };

    let name = match key.split_once('/') {
        None => key,
        Some((prefix, name)) => {
            if prefix.is_empty() {
                return Err(invalid("prefix part must be non-empty"));
            }
            if name.contains('/') {
                return Err(invalid("a qualified name may contain at most one '/'"));
            }
            validate_dns_subdomain(prefix).map_err(invalid)?;
            name
        }
    };

    if name.is_empty() {
        return Err(invalid("name part must be non-empty"));
    }
    validate_name_part(name).map_err(invalid)
}

fn validate_value(key: &str, value: &str) -> Result<(), SelectorError> {
    if value.is_empty() {
        return Ok(());
    }
    validate_name_part(value).map_err(|reason| SelectorError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    })
}

fn validate_name_part(name: &str) -> Result<(), &'static str> {
    if name.len() > MAX_NAME_LENGTH {
        return Err("must be no more than 63 characters");
    }
    let bytes = name.as_bytes();
    let edges_ok = bytes.first().is_some_and(u8::is_ascii_alphanumeric)
        && bytes.last().is_some_and(u8::is_ascii_alphanumeric);
    let body_ok = bytes
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
    if edges_ok && body_ok {
        Ok(())
    } else {
        Err("must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character")
    }
}

fn validate_dns_subdomain(prefix: &str) -> Result<(), &'static str> {
    if prefix.len() > MAX_PREFIX_LENGTH {
        return Err("prefix part must be no more than 253 characters");
    }
    let label_ok = |label: &str| {
        let bytes = label.as_bytes();
        bytes.first().is_some_and(is_lower_alphanumeric)
            && bytes.last().is_some_and(is_lower_alphanumeric)
            && bytes.iter().all(|b| is_lower_alphanumeric(b) || *b == b'-')
    };
    if prefix.split('.').all(label_ok) {
        Ok(())
    } else {
        Err("prefix part must be a lowercase RFC 1123 subdomain")
    }
}

fn is_lower_alphanumeric(b: &u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit()
}
