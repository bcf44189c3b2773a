use crate::container::Scope;
use crate::Ref;

pub type ConstructResult<T> = anyhow::Result<T>;

/// A concrete implementation the engine knows how to build.
///
/// The scope hands the constructor its dependency resolver and the named
/// parameters attached to the binding.
pub trait Construct: Sized + Send + Sync + 'static {
    fn construct(scope: &Scope<'_>) -> ConstructResult<Self>;
}

/// Anything a binding can produce: cheap to clone and shareable across threads.
/// In practice this is `Ref<dyn Trait>` or another handle type.
pub trait Resolvable: Clone + Send + Sync + 'static {}

impl<T> Resolvable for T where T: Clone + Send + Sync + 'static {}

/// Adapts a constructed implementation into the capability it is bound under.
///
/// For trait-object capabilities the impl body is the unsizing coercion:
///
/// ```ignore
/// impl Capability<PgUserStore> for Ref<dyn UserStore> {
///     fn adapt(implementation: Ref<PgUserStore>) -> Self {
///         implementation
///     }
/// }
/// ```
pub trait Capability<T>: Resolvable {
    fn adapt(implementation: Ref<T>) -> Self;
}

/// Every concrete type is a capability of itself.
impl<T> Capability<T> for Ref<T>
where
    T: Send + Sync + 'static,
{
    fn adapt(implementation: Ref<T>) -> Self {
        implementation
    }
}
