use std::any::{type_name, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::builder::Lifetime;
use crate::component::Resolvable;
use crate::error::Error;
use crate::helpers::{lock, BoxAny};
use crate::parameter::ParameterSet;

pub(crate) type SharedInstance = Arc<BoxAny>;
pub(crate) type ConstructFn =
    Box<dyn for<'s> Fn(&Scope<'s>) -> Result<BoxAny, Error> + Send + Sync>;
pub(crate) type AdaptFn = Box<dyn Fn(&SharedInstance) -> BoxAny + Send + Sync>;
pub(crate) type InstanceFn = Box<dyn Fn() -> BoxAny + Send + Sync>;

/// The activation half of a component binding, shared by every capability the
/// component is bound under so singleton state is shared too.
pub(crate) struct ComponentSource {
    pub(crate) impl_id: TypeId,
    pub(crate) impl_name: &'static str,
    pub(crate) parameters: ParameterSet,
    pub(crate) construct: ConstructFn,
    pub(crate) shared: Mutex<Option<SharedInstance>>,
}

impl ComponentSource {
    fn activate(
        &self,
        container: &Container,
        request: Option<&RequestCache>,
    ) -> Result<SharedInstance, Error> {
        tracing::trace!(component = self.impl_name, "activating component");
        let scope = Scope {
            container,
            request,
            parameters: &self.parameters,
        };
        (self.construct)(&scope).map(Arc::new)
    }

    // The cell lock is held across activation so racing resolvers serialize on
    // exactly one construction. A failed construction leaves the cell empty.
    fn shared(
        &self,
        container: &Container,
        request: Option<&RequestCache>,
    ) -> Result<SharedInstance, Error> {
        let mut slot = lock(&self.shared);
        if let Some(existing) = slot.as_ref() {
            return Ok(existing.clone());
        }
        let built = self.activate(container, request)?;
        *slot = Some(built.clone());
        Ok(built)
    }
}

impl fmt::Debug for ComponentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentSource")
            .field("impl_name", &self.impl_name)
            .finish()
    }
}

pub(crate) enum Target {
    Instance(InstanceFn),
    Component {
        source: Arc<ComponentSource>,
        adapt: AdaptFn,
    },
}

pub(crate) struct Binding {
    pub(crate) capability: &'static str,
    pub(crate) lifetime: Lifetime,
    pub(crate) target: Target,
}

impl Binding {
    fn produce(
        &self,
        container: &Container,
        request: Option<&RequestCache>,
    ) -> Result<BoxAny, Error> {
        match &self.target {
            Target::Instance(make) => Ok(make()),
            Target::Component { source, adapt } => {
                let shared = match self.lifetime {
                    Lifetime::Transient => source.activate(container, request)?,
                    Lifetime::Singleton => source.shared(container, request)?,
                    Lifetime::PerRequest => match request {
                        Some(cache) => cache.instance(source, container)?,
                        // outside a request scope the binding degrades to transient
                        None => source.activate(container, request)?,
                    },
                };
                Ok(adapt(&shared))
            }
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("capability", &self.capability)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// The immutable resolution graph built once at freeze time.
#[derive(Debug)]
pub struct Container {
    pub(crate) bindings: BTreeMap<TypeId, Binding>,
}

impl Container {
    pub fn resolve<I>(&self) -> Result<I, Error>
    where
        I: Resolvable,
    {
        self.resolve_scoped(None)
    }

    /// Opens a scope in which per-request bindings resolve to one shared
    /// instance each. Dropping the scope drops its cached instances.
    pub fn request_scope(&self) -> RequestScope<'_> {
        RequestScope {
            container: self,
            cache: RequestCache::default(),
        }
    }

    pub(crate) fn resolve_scoped<I>(&self, request: Option<&RequestCache>) -> Result<I, Error>
    where
        I: Resolvable,
    {
        let binding = self
            .bindings
            .get(&TypeId::of::<I>())
            .ok_or(Error::NotRegistered(type_name::<I>()))?;
        let produced = binding.produce(self, request)?;
        Ok(*produced
            .downcast::<I>()
            .expect("bindings are keyed by the capability type they produce"))
    }
}

/// A constructor's view of the container: dependency resolution plus the named
/// parameters attached to the binding being activated.
pub struct Scope<'a> {
    container: &'a Container,
    request: Option<&'a RequestCache>,
    parameters: &'a ParameterSet,
}

impl Scope<'_> {
    pub fn resolve<D>(&self) -> Result<D, Error>
    where
        D: Resolvable,
    {
        self.container.resolve_scoped(self.request)
    }

    /// Named-parameter lookup; `None` when the name is absent or the value has
    /// a different type. Duplicate names are last-write-wins.
    pub fn parameter<V>(&self, name: &str) -> Option<V>
    where
        V: Clone + 'static,
    {
        self.parameters.value(name)
    }
}

#[derive(Default)]
pub(crate) struct RequestCache {
    instances: Mutex<BTreeMap<TypeId, SharedInstance>>,
}

impl RequestCache {
    fn instance(
        &self,
        source: &ComponentSource,
        container: &Container,
    ) -> Result<SharedInstance, Error> {
        if let Some(existing) = lock(&self.instances).get(&source.impl_id) {
            return Ok(existing.clone());
        }
        // The lock is released while activating so nested per-request
        // dependencies can cache themselves; the first stored instance wins.
        let built = source.activate(container, Some(self))?;
        let mut instances = lock(&self.instances);
        Ok(instances.entry(source.impl_id).or_insert(built).clone())
    }
}

/// One inbound request's resolution view over a shared container.
pub struct RequestScope<'c> {
    container: &'c Container,
    cache: RequestCache,
}

impl RequestScope<'_> {
    pub fn resolve<I>(&self) -> Result<I, Error>
    where
        I: Resolvable,
    {
        self.container.resolve_scoped(Some(&self.cache))
    }
}
