use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The container has been built; the registration phase is closed.
    #[error("registry is frozen, registrations are closed once the container is built")]
    RegistryFrozen,
    /// No implementation is bound under the requested capability.
    #[error("no implementation registered for capability {0}")]
    NotRegistered(&'static str),
    /// A bound component failed to construct.
    #[error("construction failed: {0}")]
    Construction(Arc<anyhow::Error>),
}
