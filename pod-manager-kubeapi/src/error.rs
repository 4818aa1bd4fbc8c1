pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(r#"pods "{name}" not found in namespace "{namespace}""#)]
    NotFound { namespace: String, name: String },

    #[error(r#"operation cannot be fulfilled on pods "{name}" in namespace "{namespace}": {message}"#)]
    Conflict {
        namespace: String,
        name: String,
        message: String,
    },

    #[error("kubernetes API error {code} ({reason}): {message}")]
    Api {
        code: u16,
        reason: String,
        message: String,
    },

    #[error("pod is missing metadata.{0}")]
    MissingMetadata(&'static str),

    #[error(transparent)]
    Kube(kube::Error),
}

impl Error {
    /// Translates an error returned by a call that targeted a single Pod.
    ///
    /// 404 and 409 statuses become [`Error::NotFound`] and [`Error::Conflict`];
    /// everything else goes through the generic `From<kube::Error>` mapping.
    pub fn from_pod_error(err: kube::Error, namespace: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(status) if status.code == NOT_FOUND => Self::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            kube::Error::Api(status) if status.code == CONFLICT => Self::Conflict {
                namespace: namespace.to_string(),
                name: name.to_string(),
                message: status.message.clone(),
            },
            other => Self::from(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Api { code, .. } => *code == NOT_FOUND,
            _ => false,
        }
    }

    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::Api { code, .. } => *code == CONFLICT,
            _ => false,
        }
    }
}

impl From<kube::Error> for Error {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(status) => Self::Api {
                code: status.code,
                reason: status.reason.clone(),
                message: status.message.clone(),
            },
            other => Self::Kube(other),
        }
    }
}

const NOT_FOUND: u16 = 404;
const CONFLICT: u16 = 409;
