use pod_manager_ext::SelectorError;
use pod_manager_kubeapi as kubeapi;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] kubeapi::Error),

    #[error("invalid label selector: {0}")]
    InvalidSelector(#[from] SelectorError),

    #[error("retries exhausted: insufficient retries (<={retries}) to merge annotations to pod {namespace}/{name}")]
    RetriesExhausted {
        namespace: String,
        name: String,
        retries: usize,
    },

    #[error("invalid configuration {key}: {reason}")]
    Config { key: &'static str, reason: String },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Client(err) if err.is_not_found())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Client(err) if err.is_conflict())
    }

    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }
}

impl From<kube::Error> for Error {
    fn from(err: kube::Error) -> Self {
        Self::Client(err.into())
    }
}
