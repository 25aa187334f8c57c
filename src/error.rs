use std::path::PathBuf;

/// Everything that can stop the watcher before or while it runs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to read kubeconfig {path}: {source}")]
    Kubeconfig {
        path: PathBuf,
        #[source]
        source: kube::config::KubeconfigError,
    },

    #[error("unable to build cluster configuration: {0}")]
    Config(#[from] kube::config::KubeconfigError),

    #[error("unable to infer cluster configuration: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),

    #[error("Kubernetes reported error: {0}")]
    Kube(#[from] kube::Error),

    #[error("no API resources detected")]
    NoResources,

    #[error("invalid resource identifier {0:?}, expected <resource>.<version>.<group>")]
    InvalidResource(String),

    #[error("resource {0} is not served by the cluster")]
    UnknownResource(String),

    #[error("resource {0} does not support list and watch")]
    NotWatchable(String),

    #[error("error choosing resource: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("no resource chosen")]
    NoSelection,

    #[error("unable to serialize object: {0}")]
    Serialize(#[from] serde_yaml::Error),
}
