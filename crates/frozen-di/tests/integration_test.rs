use std::sync::atomic::{AtomicUsize, Ordering};

use frozen_di::*;

pub trait ConfigService: Send + Sync {
    fn value(&self) -> i32;
}

struct StaticConfig {
    value: i32,
}

impl ConfigService for StaticConfig {
    fn value(&self) -> i32 {
        self.value
    }
}

impl Construct for StaticConfig {
    fn construct(scope: &Scope<'_>) -> ConstructResult<Self> {
        if let Some(builds) = scope.parameter::<Ref<AtomicUsize>>("builds") {
            builds.fetch_add(1, Ordering::SeqCst);
        }
        Ok(StaticConfig {
            value: scope.parameter("value").unwrap_or(42),
        })
    }
}

impl Capability<StaticConfig> for Ref<dyn ConfigService> {
    fn adapt(implementation: Ref<StaticConfig>) -> Self {
        implementation
    }
}

pub trait Report: Send + Sync {
    fn summary(&self) -> String;
}

struct ReportService {
    config: Ref<dyn ConfigService>,
}

impl Report for ReportService {
    fn summary(&self) -> String {
        format!("value={}", self.config.value())
    }
}

impl Construct for ReportService {
    fn construct(scope: &Scope<'_>) -> ConstructResult<Self> {
        Ok(ReportService {
            config: scope.resolve()?,
        })
    }
}

impl Capability<ReportService> for Ref<dyn Report> {
    fn adapt(implementation: Ref<ReportService>) -> Self {
        implementation
    }
}

#[test]
fn transient_resolves_fresh_instances() {
    let registry = Registry::new();
    registry
        .register::<StaticConfig, Ref<dyn ConfigService>>(&[])
        .unwrap();

    let first: Ref<dyn ConfigService> = registry.resolve().unwrap();
    let second: Ref<dyn ConfigService> = registry.resolve().unwrap();

    assert_eq!(first.value(), 42);
    assert!(!Ref::ptr_eq(&first, &second));
}

#[test]
fn singleton_resolves_shared_instance() {
    let registry = Registry::new();
    registry
        .register_singleton::<StaticConfig, Ref<dyn ConfigService>>(&[])
        .unwrap();

    let first: Ref<dyn ConfigService> = registry.resolve().unwrap();
    let second: Ref<dyn ConfigService> = registry.resolve().unwrap();

    assert!(Ref::ptr_eq(&first, &second));
}

#[test]
fn named_parameters_override_defaults() {
    let registry = Registry::new();
    registry
        .register::<StaticConfig, Ref<dyn ConfigService>>(&[Parameter::new("value", 7)])
        .unwrap();

    let config: Ref<dyn ConfigService> = registry.resolve().unwrap();
    assert_eq!(config.value(), 7);
}

#[test]
fn later_parameter_wins_for_duplicate_names() {
    let registry = Registry::new();
    registry
        .register::<StaticConfig, Ref<dyn ConfigService>>(&[
            Parameter::new("value", 1),
            Parameter::new("value", 9),
        ])
        .unwrap();

    let config: Ref<dyn ConfigService> = registry.resolve().unwrap();
    assert_eq!(config.value(), 9);
}

#[test]
fn instance_registration_preserves_identity() {
    let registry = Registry::new();
    let original: Ref<dyn ConfigService> = Ref::new(StaticConfig { value: 1 });
    registry.register_instance(original.clone()).unwrap();

    let resolved: Ref<dyn ConfigService> = registry.resolve().unwrap();
    assert!(Ref::ptr_eq(&original, &resolved));
}

#[test]
fn unregistered_capability_fails_resolve() {
    let registry = Registry::new();

    let result = registry.resolve::<Ref<dyn ConfigService>>();
    match result {
        Err(Error::NotRegistered(name)) => assert!(name.contains("ConfigService")),
        other => panic!("expected NotRegistered, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn try_resolve_returns_default_when_unregistered() {
    let registry = Registry::new();
    let fallback: Ref<dyn ConfigService> = Ref::new(StaticConfig { value: -1 });

    let resolved = registry.try_resolve(fallback.clone()).unwrap();
    assert!(Ref::ptr_eq(&fallback, &resolved));
}

#[test]
fn construction_failure_propagates_through_both_resolve_forms() {
    struct BrokenService;

    impl ConfigService for BrokenService {
        fn value(&self) -> i32 {
            0
        }
    }

    impl Construct for BrokenService {
        fn construct(_: &Scope<'_>) -> ConstructResult<Self> {
            Err(anyhow::anyhow!("backing store offline"))
        }
    }

    impl Capability<BrokenService> for Ref<dyn ConfigService> {
        fn adapt(implementation: Ref<BrokenService>) -> Self {
            implementation
        }
    }

    let registry = Registry::new();
    registry
        .register::<BrokenService, Ref<dyn ConfigService>>(&[])
        .unwrap();

    assert!(matches!(
        registry.resolve::<Ref<dyn ConfigService>>(),
        Err(Error::Construction(_))
    ));

    let fallback: Ref<dyn ConfigService> = Ref::new(StaticConfig { value: -1 });
    assert!(matches!(
        registry.try_resolve(fallback),
        Err(Error::Construction(_))
    ));
}

#[test]
fn registrations_are_rejected_after_freeze() {
    struct LateRegistration;

    impl Registration for LateRegistration {
        fn apply(&self, _: &mut Builder) {}
    }

    let registry = Registry::new();
    registry
        .register::<StaticConfig, Ref<dyn ConfigService>>(&[])
        .unwrap();
    let _: Ref<dyn ConfigService> = registry.resolve().unwrap();
    assert!(registry.is_frozen());

    assert!(matches!(
        registry.register::<StaticConfig, Ref<dyn ConfigService>>(&[]),
        Err(Error::RegistryFrozen)
    ));
    assert!(matches!(
        registry.register_singleton::<StaticConfig, Ref<dyn ConfigService>>(&[]),
        Err(Error::RegistryFrozen)
    ));
    assert!(matches!(
        registry.add_registration(LateRegistration),
        Err(Error::RegistryFrozen)
    ));
    assert!(matches!(
        registry.register_catalogs(&[], &[], &[]),
        Err(Error::RegistryFrozen)
    ));
}

#[test]
fn duplicate_registration_kinds_are_dropped() {
    struct ConfigRegistration {
        value: i32,
    }

    impl Registration for ConfigRegistration {
        fn apply(&self, builder: &mut Builder) {
            let instance: Ref<dyn ConfigService> = Ref::new(StaticConfig { value: self.value });
            builder.instance(instance);
        }
    }

    let registry = Registry::new();
    registry
        .add_registration(ConfigRegistration { value: 1 })
        .unwrap();
    // same kind again: silently dropped, the first one wins
    registry
        .add_registration(ConfigRegistration { value: 2 })
        .unwrap();

    let config: Ref<dyn ConfigService> = registry.resolve().unwrap();
    assert_eq!(config.value(), 1);
}

#[test]
fn distinct_registration_kinds_all_apply() {
    struct ConfigRegistration;

    impl Registration for ConfigRegistration {
        fn apply(&self, builder: &mut Builder) {
            let instance: Ref<dyn ConfigService> = Ref::new(StaticConfig { value: 5 });
            builder.instance(instance);
        }
    }

    struct ReportRegistration;

    impl Registration for ReportRegistration {
        fn apply(&self, builder: &mut Builder) {
            builder
                .component::<ReportService>(Lifetime::Transient, ParameterSet::default())
                .provides::<Ref<dyn Report>>();
        }
    }

    let registry = Registry::new();
    registry.add_registration(ConfigRegistration).unwrap();
    registry.add_registration(ReportRegistration).unwrap();

    let report: Ref<dyn Report> = registry.resolve().unwrap();
    assert_eq!(report.summary(), "value=5");
}

#[test]
fn dependencies_resolve_between_components() {
    let registry = Registry::new();
    registry
        .register_singleton::<StaticConfig, Ref<dyn ConfigService>>(&[Parameter::new("value", 3)])
        .unwrap();
    registry
        .register::<ReportService, Ref<dyn Report>>(&[])
        .unwrap();

    let report: Ref<dyn Report> = registry.resolve().unwrap();
    assert_eq!(report.summary(), "value=3");
}

#[test]
fn concurrent_first_resolve_builds_container_once() {
    let registry = Registry::new();
    let builds = Ref::new(AtomicUsize::new(0));
    registry
        .register_singleton::<StaticConfig, Ref<dyn ConfigService>>(&[Parameter::new(
            "builds",
            builds.clone(),
        )])
        .unwrap();

    let resolved: Vec<Ref<dyn ConfigService>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| registry.resolve::<Ref<dyn ConfigService>>().unwrap()))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    for pair in resolved.windows(2) {
        assert!(Ref::ptr_eq(&pair[0], &pair[1]));
    }
}

pub trait Reader: Send + Sync {
    fn tag(&self) -> usize;
}

pub trait Writer: Send + Sync {
    fn tag(&self) -> usize;
}

struct MemoryStore {
    tag: usize,
}

impl Reader for MemoryStore {
    fn tag(&self) -> usize {
        self.tag
    }
}

impl Writer for MemoryStore {
    fn tag(&self) -> usize {
        self.tag
    }
}

impl Construct for MemoryStore {
    fn construct(scope: &Scope<'_>) -> ConstructResult<Self> {
        let builds = scope
            .parameter::<Ref<AtomicUsize>>("builds")
            .map(|counter| counter.fetch_add(1, Ordering::SeqCst))
            .unwrap_or(0);
        Ok(MemoryStore { tag: builds })
    }
}

impl Capability<MemoryStore> for Ref<dyn Reader> {
    fn adapt(implementation: Ref<MemoryStore>) -> Self {
        implementation
    }
}

impl Capability<MemoryStore> for Ref<dyn Writer> {
    fn adapt(implementation: Ref<MemoryStore>) -> Self {
        implementation
    }
}

#[test]
fn transient_pair_constructs_fresh_per_capability() {
    let registry = Registry::new();
    let builds = Ref::new(AtomicUsize::new(0));
    registry
        .register2::<MemoryStore, Ref<dyn Reader>, Ref<dyn Writer>>(&[Parameter::new(
            "builds",
            builds.clone(),
        )])
        .unwrap();

    let _: Ref<dyn Reader> = registry.resolve().unwrap();
    let _: Ref<dyn Writer> = registry.resolve().unwrap();
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[test]
fn singleton_pair_shares_one_instance_across_capabilities() {
    let registry = Registry::new();
    let builds = Ref::new(AtomicUsize::new(0));
    registry
        .register_singleton2::<MemoryStore, Ref<dyn Reader>, Ref<dyn Writer>>(&[Parameter::new(
            "builds",
            builds.clone(),
        )])
        .unwrap();

    let reader: Ref<dyn Reader> = registry.resolve().unwrap();
    let writer: Ref<dyn Writer> = registry.resolve().unwrap();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert_eq!(reader.tag(), writer.tag());
    assert_eq!(
        Ref::as_ptr(&reader) as *const (),
        Ref::as_ptr(&writer) as *const ()
    );
}

#[test]
fn registry_resolves_itself() {
    struct Introspector {
        registry: Ref<Registry>,
    }

    impl Construct for Introspector {
        fn construct(scope: &Scope<'_>) -> ConstructResult<Self> {
            Ok(Introspector {
                registry: scope.resolve()?,
            })
        }
    }

    let registry = Registry::new();
    registry
        .register::<Introspector, Ref<Introspector>>(&[])
        .unwrap();

    let resolved: Ref<Registry> = registry.resolve().unwrap();
    assert!(Ref::ptr_eq(&registry, &resolved));

    // the same singleton is visible from inside constructed components
    let introspector: Ref<Introspector> = registry.resolve().unwrap();
    assert!(Ref::ptr_eq(&registry, &introspector.registry));
}
