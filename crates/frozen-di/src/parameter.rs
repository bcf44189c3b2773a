use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A named constructor argument, forwarded to the engine at registration time.
///
/// The name must match whatever the target component's `construct` looks up;
/// the value is opaque to the registry itself.
#[derive(Clone)]
pub struct Parameter {
    name: String,
    value: Arc<dyn Any + Send + Sync>,
}

impl Parameter {
    pub fn new<V>(name: impl Into<String>, value: V) -> Self
    where
        V: Any + Send + Sync,
    {
        Self {
            name: name.into(),
            value: Arc::new(value),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter").field("name", &self.name).finish()
    }
}

/// The engine-native named-parameter form attached to a binding.
///
/// Conversion from `&[Parameter]` preserves input order; lookup takes the last
/// entry with a matching name, so duplicates are last-write-wins.
#[derive(Clone, Default)]
pub struct ParameterSet {
    entries: Vec<(String, Arc<dyn Any + Send + Sync>)>,
}

impl ParameterSet {
    pub fn value<V>(&self, name: &str) -> Option<V>
    where
        V: Clone + 'static,
    {
        self.entries
            .iter()
            .rev()
            .find(|(entry_name, _)| entry_name == name)
            .and_then(|(_, value)| value.downcast_ref::<V>())
            .cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl From<&[Parameter]> for ParameterSet {
    fn from(parameters: &[Parameter]) -> Self {
        Self {
            entries: parameters
                .iter()
                .map(|parameter| (parameter.name.clone(), parameter.value.clone()))
                .collect(),
        }
    }
}

impl fmt::Debug for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(name, _)| name))
            .finish()
    }
}
