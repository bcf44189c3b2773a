use crate::builder::Builder;

/// A deferred unit of container configuration.
///
/// Registrations are submitted while the registry is open, deduplicated by
/// their concrete type, and applied exactly once when the container is built.
/// Use one for environment-specific binding sets that application setup code
/// wants to hand to the registry as a single object.
pub trait Registration: Send + Sync + 'static {
    fn apply(&self, builder: &mut Builder);
}
