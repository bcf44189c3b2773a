//! Two-phase dependency injection registry.
//!
//! A [`Registry`] accepts registrations (transient, singleton, instance,
//! catalog scans) while open, then freezes on the first resolve: pending
//! registrations are replayed against a [`Builder`], the [`Container`] is
//! built exactly once, and every resolve thereafter reads the immutable
//! result. Application code depends only on the register/resolve surface,
//! never on the engine behind it.

mod builder;
pub use builder::{Builder, ComponentHandle, Lifetime};
mod catalog;
pub use catalog::{Catalog, ComponentInfo};
mod component;
pub use component::{Capability, Construct, ConstructResult, Resolvable};
mod container;
pub use container::{Container, RequestScope, Scope};
mod error;
pub use error::Error;
mod helpers;
mod parameter;
pub use parameter::{Parameter, ParameterSet};
mod registration;
pub use registration::Registration;
mod registry;
pub use registry::Registry;

pub type Ref<T> = std::sync::Arc<T>;
