//! Boot sequencer

use super::fixtures::{
    BROKEN, BROKEN_STOPS, REPORTER, REPORTER_AGAIN, ROLLBACK_REPORTER, ROLLBACK_REPORTER_STOPS,
    ROLLBACK_WORKER, ROLLBACK_WORKER_STOPS, SHUTDOWN_REPORTER, SHUTDOWN_REPORTER_STOPS, SHUTDOWN_WORKER,
    SHUTDOWN_WORKER_STOPS, TAKEOVER_STOPS, TAKEOVER_WORKER, WORKER, stops,
};
use crate::test_utils::{BusyLock, SpyLock, memory_config, unique_lock_name};
use cbo_domain::error::Error;
use cbo_domain::ports::{DatabaseProvider, ShutdownCoordinator};
use cbo_domain::value_objects::{BootPhase, MainDomState, RuntimeHash};
use cbo_infrastructure::config::{AppConfig, DatabaseConfig, TypeFinderConfig};
use cbo_infrastructure::discovery::{ComponentEntry, TypeFinder};
use cbo_infrastructure::discovery::builtin::{RuntimeReport, ScheduledPublishing};
use cbo_infrastructure::main_dom::MainDom;
use cbo_infrastructure::runtime::BootSequencer;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn sequencer(config: AppConfig) -> BootSequencer {
    BootSequencer::new(Arc::new(config)).with_logging(false)
}

fn finder(entries: Vec<&'static ComponentEntry>) -> TypeFinder {
    TypeFinder::with_entries(entries, &TypeFinderConfig::default())
}

fn failed_cause(err: Error) -> Error {
    match err {
        Error::Boot { source, .. } => *source,
        other => panic!("Expected Boot error, got {other}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_boot_reaches_running() {
    let config = memory_config(&unique_lock_name("boot"));
    let runtime = sequencer(config).boot().await.unwrap();

    assert_eq!(runtime.state().phase(), BootPhase::Running);
    assert!(runtime.is_main_dom());
    assert!(runtime.components().get(ScheduledPublishing::NAME).is_some());
    assert!(runtime.components().get(RuntimeReport::NAME).is_some());

    let factory = runtime.factory();
    let main_dom = factory.get_instance::<MainDom>().unwrap();
    assert!(Arc::ptr_eq(&main_dom, runtime.main_dom()));
    assert_eq!(
        *factory.get_instance::<RuntimeHash>().unwrap(),
        *runtime.runtime_hash()
    );
    assert!(factory.get_instance::<AppConfig>().is_ok());
    assert!(factory.get_instance::<dyn ShutdownCoordinator>().is_ok());
    assert!(factory.try_get_instance::<dyn DatabaseProvider>().unwrap().is_none());

    runtime.shutdown().await.unwrap();
    assert_eq!(runtime.main_dom().state(), MainDomState::Released);
    assert!(runtime.shutdown_coordinator().is_shutting_down());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalid_configuration_fails_before_main_dom() {
    let mut config = memory_config(&unique_lock_name("invalid"));
    config.global.main_dom.lock_name = String::new();
    let spy = Arc::new(SpyLock::default());

    let mut sequencer = sequencer(config).with_main_dom_lock(spy.clone());
    let err = sequencer.boot().await.unwrap_err();

    assert_eq!(err.boot_phase(), Some(BootPhase::Configuring));
    assert!(matches!(failed_cause(err), Error::Configuration { .. }));
    assert_eq!(spy.acquires(), 0);
    assert!(sequencer.state().is_failed());
    assert_eq!(sequencer.state().failure().unwrap().phase, BootPhase::Configuring);
    assert!(sequencer.container().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_debug_hosting_times_each_phase() {
    let mut config = memory_config(&unique_lock_name("profiled"));
    config.hosting.debug = true;
    let runtime = sequencer(config).boot().await.unwrap();

    let phases: Vec<BootPhase> = runtime.phase_timings().iter().map(|t| t.phase).collect();
    assert_eq!(
        phases,
        [
            BootPhase::Configuring,
            BootPhase::Resolving,
            BootPhase::AcquiringMainDom,
            BootPhase::Finalizing,
        ]
    );
    runtime.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_phases_not_timed_outside_debug_hosting() {
    let runtime = sequencer(memory_config(&unique_lock_name("unprofiled")))
        .boot()
        .await
        .unwrap();
    assert!(runtime.phase_timings().is_empty());
    runtime.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_debug_hosting_times_failed_phase() {
    let mut config = memory_config(&unique_lock_name("profiled-invalid"));
    config.hosting.debug = true;
    config.global.main_dom.lock_name = String::new();

    let mut sequencer = sequencer(config);
    sequencer.boot().await.unwrap_err();
    let phases: Vec<BootPhase> = sequencer.phase_timings().iter().map(|t| t.phase).collect();
    assert_eq!(phases, [BootPhase::Configuring]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_boot_runs_once() {
    let config = memory_config(&unique_lock_name("once"));
    let mut sequencer = sequencer(config).with_type_finder(finder(vec![]));
    let runtime = sequencer.boot().await.unwrap();

    assert!(matches!(sequencer.boot().await, Err(Error::Internal { .. })));
    runtime.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_composer_registrations_are_resolvable() {
    struct Marker(&'static str);

    let config = memory_config(&unique_lock_name("compose"));
    let runtime = sequencer(config)
        .with_type_finder(finder(vec![]))
        .compose(|container| container.register_instance(Arc::new(Marker("host"))))
        .boot()
        .await
        .unwrap();

    assert_eq!(runtime.factory().get_instance::<Marker>().unwrap().0, "host");
    runtime.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_composer_failure_fails_resolving() {
    let config = memory_config(&unique_lock_name("compose-fail"));
    let spy = Arc::new(SpyLock::default());
    let err = sequencer(config)
        .with_main_dom_lock(spy.clone())
        .compose(|_| Err(Error::configuration("missing host service")))
        .boot()
        .await
        .unwrap_err();

    assert_eq!(err.boot_phase(), Some(BootPhase::Resolving));
    assert_eq!(spy.acquires(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_duplicate_component_names_fail_resolving() {
    let config = memory_config(&unique_lock_name("dup"));
    let err = sequencer(config)
        .with_type_finder(finder(vec![&REPORTER, &REPORTER_AGAIN]))
        .boot()
        .await
        .unwrap_err();

    assert_eq!(err.boot_phase(), Some(BootPhase::Resolving));
    assert!(matches!(failed_cause(err), Error::TypeDiscovery { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_non_main_instance_skips_main_only_components() {
    let mut config = memory_config(&unique_lock_name("non-main"));
    config.global.main_dom.acquire_timeout_ms = 50;
    let runtime = sequencer(config)
        .with_main_dom_lock(Arc::new(BusyLock))
        .with_type_finder(finder(vec![&WORKER, &REPORTER]))
        .boot()
        .await
        .unwrap();

    assert_eq!(runtime.state().phase(), BootPhase::Running);
    assert!(!runtime.is_main_dom());
    assert_eq!(runtime.main_dom().state(), MainDomState::NonMain);
    assert!(runtime.components().get("worker").is_none());
    assert!(runtime.components().get("reporter").is_some());
    runtime.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failing_component_releases_main_dom() {
    let config = memory_config(&unique_lock_name("broken"));
    let spy = Arc::new(SpyLock::default());
    let err = sequencer(config)
        .with_main_dom_lock(spy.clone())
        .with_type_finder(finder(vec![&BROKEN]))
        .boot()
        .await
        .unwrap_err();

    assert_eq!(err.boot_phase(), Some(BootPhase::Finalizing));
    assert_eq!(spy.acquires(), 1);
    assert_eq!(spy.releases(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failing_component_stops_started_components() {
    let config = memory_config(&unique_lock_name("rollback"));
    let spy = Arc::new(SpyLock::default());
    let err = sequencer(config)
        .with_main_dom_lock(spy.clone())
        .with_type_finder(finder(vec![&ROLLBACK_WORKER, &ROLLBACK_REPORTER, &BROKEN]))
        .boot()
        .await
        .unwrap_err();

    assert_eq!(err.boot_phase(), Some(BootPhase::Finalizing));
    // each started component stops exactly once, the main-only one through MainDom
    assert_eq!(stops(&ROLLBACK_REPORTER_STOPS), 1);
    assert_eq!(stops(&ROLLBACK_WORKER_STOPS), 1);
    // the failing component never started
    assert_eq!(stops(&BROKEN_STOPS), 0);
    assert_eq!(spy.releases(), 1);
    assert!(!spy.is_held());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_stops_every_component_once() {
    let config = memory_config(&unique_lock_name("shutdown"));
    let runtime = sequencer(config)
        .with_type_finder(finder(vec![&SHUTDOWN_WORKER, &SHUTDOWN_REPORTER]))
        .boot()
        .await
        .unwrap();
    assert_eq!(runtime.main_dom().callback_count(), 1);

    runtime.shutdown().await.unwrap();
    runtime.shutdown().await.unwrap();
    assert_eq!(stops(&SHUTDOWN_WORKER_STOPS), 1);
    assert_eq!(stops(&SHUTDOWN_REPORTER_STOPS), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_newer_runtime_takes_over_main_dom() {
    let lock_name = unique_lock_name("takeover");
    let first = sequencer(memory_config(&lock_name))
        .with_type_finder(finder(vec![&TAKEOVER_WORKER]))
        .boot()
        .await
        .unwrap();
    assert!(first.is_main_dom());

    let mut config = memory_config(&lock_name);
    config.global.main_dom.acquire_timeout_ms = 5_000;
    let second = sequencer(config)
        .with_type_finder(finder(vec![&TAKEOVER_WORKER]))
        .boot()
        .await
        .unwrap();

    assert!(second.is_main_dom());
    assert!(second.components().get("takeover-worker").is_some());
    let mut state = first.main_dom().subscribe();
    tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| *s == MainDomState::Released))
        .await
        .expect("first runtime should release")
        .unwrap();
    assert!(stops(&TAKEOVER_STOPS) >= 1);

    second.shutdown().await.unwrap();
    first.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_embedded_database_is_created() {
    let content = TempDir::new().unwrap();
    let mut config = memory_config(&unique_lock_name("sqlite"));
    config.hosting.content_root = content.path().to_path_buf();
    config.database = DatabaseConfig {
        provider: Some("sqlite".to_string()),
        connection_string: Some("Data Source=data/site.db;Cache=Shared".to_string()),
    };

    let runtime = sequencer(config)
        .with_type_finder(finder(vec![]))
        .boot()
        .await
        .unwrap();

    assert!(content.path().join("data/site.db").exists());
    let provider = runtime.factory().get_instance::<dyn DatabaseProvider>().unwrap();
    assert_eq!(provider.name(), "sqlite");
    runtime.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_database_provider_fails_resolving() {
    let mut config = memory_config(&unique_lock_name("oracle"));
    config.database = DatabaseConfig {
        provider: Some("oracle".to_string()),
        connection_string: Some("Server=db".to_string()),
    };

    let err = sequencer(config).boot().await.unwrap_err();
    assert_eq!(err.boot_phase(), Some(BootPhase::Resolving));
    match failed_cause(err) {
        Error::ProviderUnavailable { provider, .. } => assert_eq!(provider, "oracle"),
        other => panic!("Expected ProviderUnavailable, got {other}"),
    }
}
