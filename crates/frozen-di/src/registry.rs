use std::any::TypeId;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::sync::{Mutex, OnceLock};

use crate::builder::{Builder, Lifetime};
use crate::catalog::Catalog;
use crate::component::{Capability, Construct, Resolvable};
use crate::container::{Container, RequestScope};
use crate::error::Error;
use crate::helpers::lock;
use crate::parameter::{Parameter, ParameterSet};
use crate::registration::Registration;
use crate::Ref;

/// Process-wide registration facade over the container engine.
///
/// The registry starts open: `register*` calls append binding directives and
/// `add_registration` queues deferred configuration work. The first resolve
/// freezes it — pending registrations are replayed, the container is built
/// once, and every later mutation attempt fails with [`Error::RegistryFrozen`].
///
/// Registration calls are expected to happen during single-threaded startup;
/// resolution is safe from any number of threads.
pub struct Registry {
    builder: Mutex<Option<Builder>>,
    pending: Mutex<BTreeMap<TypeId, Box<dyn Registration>>>,
    container: OnceLock<Container>,
}

impl Registry {
    /// Creates the registry and binds it under its own abstraction, so any
    /// constructed component can resolve `Ref<Registry>` and get this exact
    /// instance back.
    pub fn new() -> Ref<Self> {
        let registry = Ref::new(Self {
            builder: Mutex::new(Some(Builder::new())),
            pending: Mutex::new(BTreeMap::new()),
            container: OnceLock::new(),
        });
        let this = registry.clone();
        if let Some(builder) = lock(&registry.builder).as_mut() {
            builder.instance::<Ref<Registry>>(this);
        }
        registry
    }

    /// Queues a deferred registration, applied once when the container is
    /// built. A registration of the same concrete type already queued makes
    /// this a silent no-op: the first one wins.
    pub fn add_registration<R>(&self, registration: R) -> Result<(), Error>
    where
        R: Registration,
    {
        // Guarded by the builder slot, not `is_frozen`: the freeze drains the
        // pending map while holding the builder lock, so a registration can
        // never slip in between the drain and the container becoming visible.
        let builder_slot = lock(&self.builder);
        if builder_slot.is_none() {
            return Err(Error::RegistryFrozen);
        }
        let mut pending = lock(&self.pending);
        match pending.entry(TypeId::of::<R>()) {
            Entry::Occupied(_) => {
                tracing::debug!(
                    kind = std::any::type_name::<R>(),
                    "duplicate registration kind ignored"
                );
            }
            Entry::Vacant(slot) => {
                slot.insert(Box::new(registration));
            }
        }
        Ok(())
    }

    /// Binds `T` under capability `I`, constructed fresh on every resolve.
    pub fn register<T, I>(&self, parameters: &[Parameter]) -> Result<(), Error>
    where
        T: Construct,
        I: Capability<T>,
    {
        let parameters = ParameterSet::from(parameters);
        self.with_builder(|builder| {
            builder.component::<T>(Lifetime::Transient, parameters).provides::<I>();
        })
    }

    /// Binds `T` under both capabilities, constructed fresh on every resolve
    /// of either.
    pub fn register2<T, I1, I2>(&self, parameters: &[Parameter]) -> Result<(), Error>
    where
        T: Construct,
        I1: Capability<T>,
        I2: Capability<T>,
    {
        let parameters = ParameterSet::from(parameters);
        self.with_builder(|builder| {
            builder
                .component::<T>(Lifetime::Transient, parameters)
                .provides::<I1>()
                .provides::<I2>();
        })
    }

    /// Binds `T` under capability `I`; one instance is constructed on first
    /// resolve and shared for the rest of the process.
    pub fn register_singleton<T, I>(&self, parameters: &[Parameter]) -> Result<(), Error>
    where
        T: Construct,
        I: Capability<T>,
    {
        let parameters = ParameterSet::from(parameters);
        self.with_builder(|builder| {
            builder.component::<T>(Lifetime::Singleton, parameters).provides::<I>();
        })
    }

    /// Binds `T` under both capabilities; the single constructed instance is
    /// shared across resolutions of either one.
    pub fn register_singleton2<T, I1, I2>(&self, parameters: &[Parameter]) -> Result<(), Error>
    where
        T: Construct,
        I1: Capability<T>,
        I2: Capability<T>,
    {
        let parameters = ParameterSet::from(parameters);
        self.with_builder(|builder| {
            builder
                .component::<T>(Lifetime::Singleton, parameters)
                .provides::<I1>()
                .provides::<I2>();
        })
    }

    /// Binds a pre-built value directly; every resolve of `I` returns that
    /// exact value, construction is bypassed entirely.
    pub fn register_instance<I>(&self, instance: I) -> Result<(), Error>
    where
        I: Resolvable,
    {
        self.with_builder(|builder| {
            builder.instance(instance);
        })
    }

    /// Bulk-registers catalog components as transients, bound under every
    /// capability they declare.
    ///
    /// Components whose `TypeId` is listed in `exclude` are skipped; when
    /// `suffix_filters` is non-empty, only components whose short type name
    /// ends with one of the suffixes survive. An empty catalog slice is a
    /// no-op.
    pub fn register_catalogs(
        &self,
        catalogs: &[Catalog],
        exclude: &[TypeId],
        suffix_filters: &[&str],
    ) -> Result<(), Error> {
        self.scan_catalogs(catalogs, exclude, suffix_filters, Lifetime::Transient)
    }

    /// Same scan and filter semantics as [`register_catalogs`], but surviving
    /// components are scoped to one instance per request. The lifetime policy
    /// itself is interpreted by the engine, not here.
    ///
    /// [`register_catalogs`]: Registry::register_catalogs
    pub fn register_catalogs_per_request(
        &self,
        catalogs: &[Catalog],
        exclude: &[TypeId],
        suffix_filters: &[&str],
    ) -> Result<(), Error> {
        self.scan_catalogs(catalogs, exclude, suffix_filters, Lifetime::PerRequest)
    }

    /// Resolves the implementation registered under capability `I`, building
    /// the container first if this is the first resolution anywhere.
    pub fn resolve<I>(&self) -> Result<I, Error>
    where
        I: Resolvable,
    {
        self.container().resolve()
    }

    /// Like [`resolve`], but an unregistered capability yields `default`
    /// instead of failing. Construction failures still propagate.
    ///
    /// [`resolve`]: Registry::resolve
    pub fn try_resolve<I>(&self, default: I) -> Result<I, Error>
    where
        I: Resolvable,
    {
        match self.container().resolve() {
            Err(Error::NotRegistered(_)) => Ok(default),
            other => other,
        }
    }

    /// Opens a per-request resolution scope, freezing the registry if needed.
    pub fn request_scope(&self) -> RequestScope<'_> {
        self.container().request_scope()
    }

    pub fn is_frozen(&self) -> bool {
        self.container.get().is_some()
    }

    fn scan_catalogs(
        &self,
        catalogs: &[Catalog],
        exclude: &[TypeId],
        suffix_filters: &[&str],
        lifetime: Lifetime,
    ) -> Result<(), Error> {
        self.with_builder(|builder| {
            builder.scan(catalogs, lifetime, |component| {
                if exclude.contains(&component.type_id) {
                    return false;
                }
                suffix_filters.is_empty()
                    || suffix_filters
                        .iter()
                        .any(|suffix| component.short_name().ends_with(suffix))
            });
        })
    }

    // The builder slot is `None` exactly from the moment the freeze takes it,
    // so this check is also the frozen-state guard for all mutating calls.
    fn with_builder<R>(&self, configure: impl FnOnce(&mut Builder) -> R) -> Result<R, Error> {
        let mut slot = lock(&self.builder);
        match slot.as_mut() {
            Some(builder) => Ok(configure(builder)),
            None => Err(Error::RegistryFrozen),
        }
    }

    /// Returns the container, building it on first use. Concurrent first
    /// resolvers block until the single build completes; afterwards this is a
    /// lock-free read.
    fn container(&self) -> &Container {
        self.container.get_or_init(|| {
            let mut slot = lock(&self.builder);
            let mut builder = slot
                .take()
                .expect("builder is present until the first freeze");
            let pending = mem::take(&mut *lock(&self.pending));
            tracing::debug!(registrations = pending.len(), "freezing registry");
            for registration in pending.into_values() {
                registration.apply(&mut builder);
            }
            builder.build()
        })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("frozen", &self.is_frozen())
            .field("pending", &lock(&self.pending).len())
            .finish()
    }
}
