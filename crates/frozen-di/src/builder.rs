use std::any::{type_name, TypeId};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use crate::catalog::{Catalog, ComponentInfo};
use crate::component::{Capability, Construct, Resolvable};
use crate::container::{
    AdaptFn, Binding, ComponentSource, ConstructFn, Container, Scope, Target,
};
use crate::error::Error;
use crate::helpers::BoxAny;
use crate::parameter::ParameterSet;
use crate::Ref;

/// How long a constructed instance is reused by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Fresh instance on every resolve.
    Transient,
    /// One instance for the container's whole life.
    Singleton,
    /// One instance per request scope.
    PerRequest,
}

/// Accumulates binding directives until the container is built.
///
/// Bindings under the same capability overwrite: last write wins.
#[derive(Debug, Default)]
pub struct Builder {
    bindings: BTreeMap<TypeId, Binding>,
}

impl Builder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Starts a component binding; chain `provides` to bind it under each of
    /// its capabilities.
    pub fn component<T>(&mut self, lifetime: Lifetime, parameters: ParameterSet) -> ComponentHandle<'_, T>
    where
        T: Construct,
    {
        // A nested construction failure passes through undoubled; everything
        // else the constructor reports, including a missing dependency, is a
        // construction failure of this component. `NotRegistered` only ever
        // refers to the capability the caller asked for directly.
        let construct: ConstructFn = Box::new(|scope: &Scope<'_>| {
            T::construct(scope)
                .map(|built| Box::new(Ref::new(built)) as BoxAny)
                .map_err(|err| match err.downcast::<Error>() {
                    Ok(nested @ Error::Construction(_)) => nested,
                    Ok(other) => Error::Construction(Arc::new(other.into())),
                    Err(other) => Error::Construction(Arc::new(other)),
                })
        });
        let source = Arc::new(ComponentSource {
            impl_id: TypeId::of::<T>(),
            impl_name: type_name::<T>(),
            parameters,
            construct,
            shared: Mutex::new(None),
        });
        ComponentHandle {
            builder: self,
            source,
            lifetime,
            _impl: PhantomData,
        }
    }

    /// Binds a pre-built value; every resolve of `I` returns a clone of it.
    pub fn instance<I>(&mut self, instance: I) -> &mut Self
    where
        I: Resolvable,
    {
        self.bindings.insert(
            TypeId::of::<I>(),
            Binding {
                capability: type_name::<I>(),
                lifetime: Lifetime::Singleton,
                target: Target::Instance(Box::new(move || Box::new(instance.clone()))),
            },
        );
        self
    }

    /// Applies the bindings of every catalog component accepted by the
    /// predicate, under the given lifetime.
    pub fn scan<F>(&mut self, catalogs: &[Catalog], lifetime: Lifetime, predicate: F)
    where
        F: Fn(&ComponentInfo) -> bool,
    {
        for catalog in catalogs {
            for component in catalog.components() {
                if predicate(component.info()) {
                    component.bind(self, lifetime);
                } else {
                    tracing::trace!(
                        catalog = catalog.name(),
                        component = component.info().type_name,
                        "component filtered out of scan"
                    );
                }
            }
        }
    }

    pub(crate) fn build(self) -> Container {
        Container {
            bindings: self.bindings,
        }
    }
}

/// Fluent handle over one component being bound.
pub struct ComponentHandle<'b, T> {
    builder: &'b mut Builder,
    source: Arc<ComponentSource>,
    lifetime: Lifetime,
    _impl: PhantomData<fn() -> T>,
}

impl<T> ComponentHandle<'_, T>
where
    T: Construct,
{
    /// Binds the component under capability `I`. A component bound under
    /// several capabilities keeps one activation source, so a singleton is
    /// shared across all of them.
    pub fn provides<I>(&mut self) -> &mut Self
    where
        I: Capability<T>,
    {
        let adapt: AdaptFn = Box::new(|shared: &Arc<BoxAny>| {
            let implementation = shared
                .downcast_ref::<Ref<T>>()
                .expect("component source holds its own implementation type")
                .clone();
            Box::new(I::adapt(implementation))
        });
        self.builder.bindings.insert(
            TypeId::of::<I>(),
            Binding {
                capability: type_name::<I>(),
                lifetime: self.lifetime,
                target: Target::Component {
                    source: self.source.clone(),
                    adapt,
                },
            },
        );
        self
    }
}
