use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use service_composer::{
    BoxError, ClassCatalog, CompositionContainer, CompositionError, ContainerConfig, Disposable,
    Export, ExportDefinition, Import, ImportBinding, ImportMany, Importable, LateRegistration,
    Module, Part, ServiceKey,
};

macro_rules! plain_part {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Importable for $ty {}
            impl Part for $ty {}
        )*
    };
}

#[derive(Default)]
struct SvcA1;
#[derive(Default)]
struct SvcA2;
plain_part!(SvcA1, SvcA2);

impl Export for SvcA1 {
    fn exports() -> Vec<ExportDefinition> {
        vec![ExportDefinition::new("svcA")]
    }
}

impl Export for SvcA2 {
    fn exports() -> Vec<ExportDefinition> {
        vec![ExportDefinition::new("svcA")]
    }
}

fn ambiguous_container() -> CompositionContainer {
    let mut container = CompositionContainer::new();
    container
        .add_catalog(ClassCatalog::of::<SvcA1>())
        .unwrap()
        .add_catalog(ClassCatalog::of::<SvcA2>())
        .unwrap();
    container
}

#[tokio::test]
async fn test_same_key_from_two_catalogs_is_ambiguous() {
    let container = ambiguous_container();

    let err = container.get_service("svcA").await.err().unwrap();
    assert!(matches!(
        err,
        CompositionError::AmbiguousService { ref key, count: 2 } if *key == ServiceKey::named("svcA")
    ));

    let all = container.get_all_services("svcA").await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[0].is::<SvcA1>());
    assert!(all[1].is::<SvcA2>());
}

#[test]
fn test_same_key_from_two_catalogs_is_ambiguous_sync() {
    let container = ambiguous_container();

    assert!(matches!(
        container.get_service_sync("svcA"),
        Err(CompositionError::AmbiguousService { count: 2, .. })
    ));

    let all = container.get_all_services_sync("svcA").unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[0].is::<SvcA1>());
    assert!(all[1].is::<SvcA2>());
}

#[derive(Default)]
struct Base;
plain_part!(Base);

impl Export for Base {
    fn exports() -> Vec<ExportDefinition> {
        vec![ExportDefinition::new("K")]
    }
}

#[derive(Default)]
struct Dependent {
    dep: Import,
}

impl Importable for Dependent {
    fn imports(&self) -> Vec<ImportBinding<'_>> {
        vec![ImportBinding::single("dep", "K", &self.dep)]
    }
}

impl Part for Dependent {}

impl Export for Dependent {
    fn exports() -> Vec<ExportDefinition> {
        vec![ExportDefinition::new("K2")]
    }
}

#[tokio::test]
async fn test_provider_imports_another_provider() {
    let mut container = CompositionContainer::new();
    container.add_class::<Base>().unwrap().add_class::<Dependent>().unwrap();

    let dependent = container.get_service("K2").await.unwrap();
    let dependent = dependent.downcast_arc::<Dependent>().ok().unwrap();
    let base = container.get_service("K").await.unwrap();

    let dep = dependent.dep.get().unwrap();
    assert!(Arc::ptr_eq(&dep, &base));
    assert!(dependent.dep.downcast::<Base>().is_some());
}

#[derive(Default)]
struct Lonely;
plain_part!(Lonely);
impl Export for Lonely {}

#[test]
fn test_single_lookup_cardinality() {
    let mut container = CompositionContainer::new();
    container.add_class::<Lonely>().unwrap();

    let err = container.get_service_sync("missing").err().unwrap();
    assert!(matches!(err, CompositionError::NotFound { ref key } if *key == ServiceKey::named("missing")));
    assert_eq!(err.to_string(), "no exported instance found for 'missing'");

    let lonely = container.get_service_sync(ServiceKey::of::<Lonely>()).unwrap();
    assert!(lonely.is::<Lonely>());
    assert!(container.get_sync::<Lonely>().is_ok());
}

#[tokio::test]
async fn test_many_lookup_with_no_match_is_empty() {
    let mut container = CompositionContainer::new();
    container.add_class::<Lonely>().unwrap();

    assert!(container.get_all_services("nobody").await.unwrap().is_empty());
    assert!(container.get_all_services_sync("nobody").unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_container_realizes_to_nothing() {
    let container = CompositionContainer::new();

    assert!(container.get_all_services("any").await.unwrap().is_empty());
    assert!(container.is_realized());
    assert_eq!(container.providers().unwrap().len(), 0);
}

static COUNTED_CREATED: AtomicUsize = AtomicUsize::new(0);

struct Counted;

impl Default for Counted {
    fn default() -> Self {
        COUNTED_CREATED.fetch_add(1, Ordering::SeqCst);
        Self
    }
}

plain_part!(Counted);

impl Export for Counted {
    fn exports() -> Vec<ExportDefinition> {
        vec![
            ExportDefinition::new("counted"),
            ExportDefinition::new("counted"),
            ExportDefinition::new(ServiceKey::of::<Counted>()),
        ]
    }
}

#[derive(Default)]
struct Consumer {
    counted: ImportMany,
    single: Import,
}

impl Importable for Consumer {
    fn imports(&self) -> Vec<ImportBinding<'_>> {
        vec![
            ImportBinding::many("counted", "counted", &self.counted),
            ImportBinding::single("single", ServiceKey::of::<Counted>(), &self.single),
        ]
    }
}

#[tokio::test]
async fn test_realization_runs_once_and_creates_one_instance_per_export() {
    let mut container = CompositionContainer::new();
    container.add_class::<Counted>().unwrap();

    for _ in 0..5 {
        let consumer = Consumer::default();
        container.compose(&consumer).await.unwrap();
        container.compose_sync(&consumer).unwrap();
        assert_eq!(consumer.counted.len(), 2);
        assert!(consumer.single.is_satisfied());
        container.get_all_services("counted").await.unwrap();
        container.get_service_sync(ServiceKey::of::<Counted>()).unwrap();
    }

    assert_eq!(COUNTED_CREATED.load(Ordering::SeqCst), 3);

    let counted = container.get_all_services_sync("counted").unwrap();
    assert!(!Arc::ptr_eq(&counted[0], &counted[1]));
}

#[derive(Default)]
struct Plugin1;
#[derive(Default)]
struct Plugin2;
plain_part!(Plugin1, Plugin2);

impl Export for Plugin1 {
    fn exports() -> Vec<ExportDefinition> {
        vec![ExportDefinition::new("plugin")]
    }
}

impl Export for Plugin2 {
    fn exports() -> Vec<ExportDefinition> {
        vec![ExportDefinition::new("plugin")]
    }
}

#[derive(Default)]
struct Host {
    plugins: ImportMany,
    logger: Import,
}

impl Importable for Host {
    fn imports(&self) -> Vec<ImportBinding<'_>> {
        vec![
            ImportBinding::many("plugins", "plugin", &self.plugins),
            ImportBinding::single("logger", ServiceKey::of::<Logger>(), &self.logger),
        ]
    }
}

impl Part for Host {}
impl Export for Host {}

#[derive(Default)]
struct Logger;
plain_part!(Logger);
impl Export for Logger {}

#[tokio::test]
async fn test_provider_imports_ignore_catalog_order() {
    let mut container = CompositionContainer::new();
    container
        .add_module(Module::new("first").with::<Plugin1>())
        .unwrap()
        .add_class::<Host>()
        .unwrap()
        .add_module(Module::new("last").with::<Logger>().with::<Plugin2>())
        .unwrap();

    let host = container.get::<Host>().await.unwrap();
    let plugins = host.plugins.get();
    assert_eq!(plugins.len(), 2);
    assert!(plugins[0].is::<Plugin1>());
    assert!(plugins[1].is::<Plugin2>());
    assert!(host.logger.downcast::<Logger>().is_some());
}

#[derive(Default)]
struct Broken {
    missing: Import,
}

impl Importable for Broken {
    fn imports(&self) -> Vec<ImportBinding<'_>> {
        vec![ImportBinding::single("missing", "absent", &self.missing)]
    }
}

impl Part for Broken {}
impl Export for Broken {}

static CONN_CREATED: AtomicUsize = AtomicUsize::new(0);
static CONN_DISPOSED: AtomicUsize = AtomicUsize::new(0);

struct Conn;

impl Default for Conn {
    fn default() -> Self {
        CONN_CREATED.fetch_add(1, Ordering::SeqCst);
        Self
    }
}

impl Importable for Conn {}

impl Part for Conn {
    fn as_disposable(&self) -> Option<&dyn Disposable> {
        Some(self)
    }
}

impl Disposable for Conn {
    fn dispose(&self) -> Result<(), BoxError> {
        CONN_DISPOSED.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Export for Conn {
    fn exports() -> Vec<ExportDefinition> {
        vec![ExportDefinition::new("conn")]
    }
}

#[tokio::test]
async fn test_unresolved_provider_import_is_reported_once_without_rebuilding() {
    let mut container = CompositionContainer::new();
    container.add_class::<Conn>().unwrap().add_class::<Broken>().unwrap();

    let err = container.get_all_services("conn").await.err().unwrap();
    assert!(matches!(err, CompositionError::NotFound { ref key } if *key == ServiceKey::named("absent")));
    assert!(container.is_realized());

    for _ in 0..3 {
        assert_eq!(container.get_all_services_sync("conn").unwrap().len(), 1);
        assert_eq!(container.get_all_services("conn").await.unwrap().len(), 1);
    }
    assert!(!container.get::<Broken>().await.unwrap().missing.is_satisfied());
    assert_eq!(CONN_CREATED.load(Ordering::SeqCst), 1);

    container.dispose().unwrap();
    assert_eq!(CONN_DISPOSED.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unresolved_provider_import_sync_keeps_providers() {
    let mut container = CompositionContainer::new();
    container.add_class::<Broken>().unwrap();

    assert!(matches!(
        container.get_all_services_sync("anything"),
        Err(CompositionError::NotFound { .. })
    ));
    assert!(container.is_realized());

    let first = container.get_service_sync(ServiceKey::of::<Broken>()).unwrap();
    let second = container.get_service_sync(ServiceKey::of::<Broken>()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[derive(Default)]
struct Twin;
plain_part!(Twin);

impl Export for Twin {
    fn exports() -> Vec<ExportDefinition> {
        vec![ExportDefinition::new("dup"), ExportDefinition::new("dup")]
    }
}

#[derive(Default)]
struct WantsTwin {
    twin: Import,
}

impl Importable for WantsTwin {
    fn imports(&self) -> Vec<ImportBinding<'_>> {
        vec![ImportBinding::single("twin", "dup", &self.twin)]
    }
}

impl Part for WantsTwin {}

impl Export for WantsTwin {
    fn exports() -> Vec<ExportDefinition> {
        vec![ExportDefinition::new("wants-twin")]
    }
}

#[tokio::test]
async fn test_single_import_on_consumer_with_two_matches_is_ambiguous() {
    let mut container = CompositionContainer::new();
    container.add_class::<Twin>().unwrap();

    let consumer = WantsTwin::default();
    let err = container.compose(&consumer).await.err().unwrap();
    assert!(matches!(
        err,
        CompositionError::AmbiguousService { ref key, count: 2 } if *key == ServiceKey::named("dup")
    ));
    assert!(matches!(
        container.compose_sync(&consumer),
        Err(CompositionError::AmbiguousService { count: 2, .. })
    ));
    assert!(!consumer.twin.is_satisfied());
}

#[tokio::test]
async fn test_single_import_between_providers_with_two_matches_is_ambiguous() {
    let mut container = CompositionContainer::new();
    container.add_class::<Twin>().unwrap().add_class::<WantsTwin>().unwrap();

    assert!(matches!(
        container.get_all_services("wants-twin").await,
        Err(CompositionError::AmbiguousService { count: 2, .. })
    ));

    let wants = container.get_service("wants-twin").await.unwrap();
    let wants = wants.downcast_arc::<WantsTwin>().ok().unwrap();
    assert!(!wants.twin.is_satisfied());
}

#[tokio::test]
async fn test_compose_all_wires_each_consumer() {
    let mut container = CompositionContainer::new();
    container.add_class::<Logger>().unwrap().add_class::<Plugin1>().unwrap();

    let first = Host::default();
    let second = Host::default();
    container.compose_all(&[&first as &dyn Importable, &second]).await.unwrap();

    assert!(first.logger.is_satisfied());
    assert!(second.logger.is_satisfied());
    assert_eq!(second.plugins.len(), 1);
    assert!(Arc::ptr_eq(
        &first.logger.get().unwrap(),
        &second.logger.get().unwrap()
    ));
}

#[test]
fn test_missing_single_import_on_consumer_is_reported() {
    let mut container = CompositionContainer::new();
    container.add_class::<Plugin1>().unwrap();
    let host = Host::default();

    let err = container.compose_sync(&host).err().unwrap();
    assert!(matches!(err, CompositionError::NotFound { ref key } if *key == ServiceKey::of::<Logger>()));
    // Imports are assigned in declaration order, so the earlier many-import stays filled.
    assert_eq!(host.plugins.len(), 1);
    assert!(host.plugins.get()[0].is::<Plugin1>());
    assert!(!host.logger.is_satisfied());
}

#[test]
fn test_late_registration_is_rejected_by_default() {
    let mut container = CompositionContainer::new();
    container.add_class::<Logger>().unwrap();
    container.get_sync::<Logger>().unwrap();

    assert!(matches!(
        container.add_class::<Plugin1>(),
        Err(CompositionError::LateRegistration)
    ));
}

#[test]
fn test_late_registration_can_be_ignored() {
    let config = ContainerConfig::default().with_late_registration(LateRegistration::Ignore);
    let mut container = CompositionContainer::with_config(config);
    container.add_class::<Logger>().unwrap();
    container.get_sync::<Logger>().unwrap();

    container.add_class::<Plugin1>().unwrap();
    assert_eq!(container.catalog_count(), 1);
    assert!(container.get_all_services_sync("plugin").unwrap().is_empty());
}

#[tokio::test]
async fn test_typed_lookup_reports_type_mismatch() {
    #[derive(Default)]
    struct Impostor;
    plain_part!(Impostor);
    impl Export for Impostor {
        fn exports() -> Vec<ExportDefinition> {
            vec![ExportDefinition::new(ServiceKey::of::<Logger>())]
        }
    }

    let mut container = CompositionContainer::new();
    container.add_class::<Impostor>().unwrap();

    assert!(matches!(
        container.get::<Logger>().await,
        Err(CompositionError::TypeMismatch { .. })
    ));
    assert!(container.get_all::<Logger>().await.unwrap().is_empty());
}
