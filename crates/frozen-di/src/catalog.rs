use std::any::{type_name, TypeId};
use std::fmt;

use crate::builder::{Builder, ComponentHandle, Lifetime};
use crate::component::Construct;
use crate::helpers::short_type_name;
use crate::parameter::ParameterSet;

/// Identity of a discoverable component, used by scan filters.
#[derive(Debug, Clone, Copy)]
pub struct ComponentInfo {
    pub type_id: TypeId,
    pub type_name: &'static str,
}

impl ComponentInfo {
    /// Unqualified type name, the part suffix filters match against.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }
}

pub(crate) struct CatalogComponent {
    info: ComponentInfo,
    bind_fn: Box<dyn Fn(&mut Builder, Lifetime) + Send + Sync>,
}

impl CatalogComponent {
    pub(crate) fn info(&self) -> &ComponentInfo {
        &self.info
    }

    pub(crate) fn bind(&self, builder: &mut Builder, lifetime: Lifetime) {
        (self.bind_fn)(builder, lifetime)
    }
}

/// An explicit discovery list: the set of components a compilation unit offers
/// for bulk registration, each declaring the capabilities it provides.
///
/// Rust has no runtime type scanning, so catalogs are assembled by hand (or by
/// generated code) and handed to the registry, which filters and binds them.
#[derive(Default)]
pub struct Catalog {
    name: String,
    components: Vec<CatalogComponent>,
}

impl Catalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
        }
    }

    /// Adds a component; `configure` declares the capabilities it provides.
    pub fn component<T>(
        &mut self,
        configure: impl for<'b> Fn(&mut ComponentHandle<'b, T>) + Send + Sync + 'static,
    ) -> &mut Self
    where
        T: Construct,
    {
        self.components.push(CatalogComponent {
            info: ComponentInfo {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
            },
            bind_fn: Box::new(move |builder, lifetime| {
                let mut handle = builder.component::<T>(lifetime, ParameterSet::default());
                configure(&mut handle);
            }),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub(crate) fn components(&self) -> &[CatalogComponent] {
        &self.components
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("name", &self.name)
            .field(
                "components",
                &self
                    .components
                    .iter()
                    .map(|component| component.info.type_name)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
