mod common;

use std::sync::Arc;

use tracing_contextual::{LevelHandle, LevelRegistry, LevelSource, RegistryError, Severity, StaticResolver};

#[test]
fn registration_arguments_are_validated() {
    let registry = LevelRegistry::new();
    let handle = LevelHandle::new(Severity::Info);
    let resolver: Arc<dyn tracing_contextual::LevelResolver> = Arc::new(StaticResolver::new());

    let no_handle = LevelSource {
        handle: None,
        key: "KEY".to_string(),
        resolver: Some(resolver.clone()),
    };
    assert_eq!(registry.register(no_handle).unwrap_err().to_string(), "handle is required");

    assert_eq!(
        registry.register_env(&handle, "").unwrap_err(),
        RegistryError::MissingKey
    );

    let no_resolver = LevelSource {
        handle: Some(handle.clone()),
        key: "KEY".to_string(),
        resolver: None,
    };
    assert_eq!(registry.register(no_resolver), Err(RegistryError::MissingResolver));
    assert!(registry.is_empty());

    let valid = LevelSource {
        handle: Some(handle.clone()),
        key: "KEY".to_string(),
        resolver: Some(resolver),
    };
    assert!(registry.register(valid).is_ok());
    assert_eq!(registry.len(), 1);
}

#[test]
fn environment_sources_drive_levels() {
    let registry = LevelRegistry::new();
    let first = LevelHandle::new(Severity::Info);
    let second = LevelHandle::new(Severity::Info);
    let first_key = "TRACING_CONTEXTUAL_IT_LEVEL_1";
    let second_key = "TRACING_CONTEXTUAL_IT_LEVEL_2";

    registry.register_env(&first, first_key).unwrap();
    registry
        .register_with(&second, second_key, |key: &str| std::env::var(key).ok())
        .unwrap();

    registry.refresh();
    assert_eq!(first.get(), Severity::Info);
    assert_eq!(second.get(), Severity::Info);

    std::env::set_var(first_key, "DEBUG");
    std::env::set_var(second_key, "INFO");
    registry.refresh();
    assert_eq!(first.get(), Severity::Debug);
    assert_eq!(second.get(), Severity::Info);

    std::env::set_var(second_key, "DEBUG");
    registry.refresh();
    assert_eq!(first.get(), Severity::Debug);
    assert_eq!(second.get(), Severity::Debug);
}

#[test]
fn partial_sources_update_only_their_handle() {
    let registry = LevelRegistry::new();
    let resolver = StaticResolver::new();
    let set = LevelHandle::new(Severity::Info);
    let unset = LevelHandle::new(Severity::Warn);

    registry.register_with(&set, "SET", resolver.clone()).unwrap();
    registry.register_with(&unset, "UNSET", resolver.clone()).unwrap();

    resolver.set("SET", "error");
    registry.refresh();

    assert_eq!(set.get(), Severity::Error);
    assert_eq!(unset.get(), Severity::Warn);
}

#[test]
fn invalid_name_keeps_level_and_warns() {
    let (dispatch, _handle, writer) = common::json_dispatch(Severity::Info);
    let registry = LevelRegistry::new();
    let resolver = StaticResolver::new();
    let handle = LevelHandle::new(Severity::Info);
    registry.register_with(&handle, "L1", resolver.clone()).unwrap();

    resolver.set("L1", "debug");
    registry.refresh();
    resolver.set("L1", "NOT_A_LEVEL");
    tracing::dispatcher::with_default(&dispatch, || registry.refresh());

    assert_eq!(handle.get(), Severity::Debug);
    let lines = writer.json_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], "WARN");
    assert_eq!(lines[0]["key"], "L1");
    assert_eq!(lines[0]["value"], "NOT_A_LEVEL");
}

#[test]
fn refreshed_levels_gate_emission() {
    let (dispatch, handle, writer) = common::json_dispatch(Severity::Info);
    let registry = LevelRegistry::new();
    let resolver = StaticResolver::new();
    registry.register_with(&handle, "APP_LEVEL", resolver.clone()).unwrap();

    tracing::dispatcher::with_default(&dispatch, || {
        tracing::debug!("dropped");
        resolver.set("APP_LEVEL", "debug");
        registry.refresh();
        tracing::debug!("kept");
    });

    let messages: Vec<String> = writer
        .json_lines()
        .iter()
        .map(|line| line["msg"].as_str().unwrap_or_default().to_string())
        .collect();
    assert!(messages.contains(&"kept".to_string()));
    assert!(messages.contains(&"log level changed".to_string()));
    assert!(!messages.contains(&"dropped".to_string()));
}

#[test]
fn concurrent_registration_and_refresh() {
    let registry = LevelRegistry::new();
    let resolver = StaticResolver::new();
    resolver.set("SHARED", "error");

    let handles: Vec<LevelHandle> = (0..8).map(|_| LevelHandle::new(Severity::Info)).collect();
    std::thread::scope(|scope| {
        for handle in &handles {
            let registry = registry.clone();
            let resolver = resolver.clone();
            scope.spawn(move || {
                registry.register_with(handle, "SHARED", resolver).unwrap();
                registry.refresh();
            });
        }
    });

    assert_eq!(registry.len(), handles.len());
    assert!(handles.iter().all(|handle| handle.get() == Severity::Error));
}

#[test]
fn global_registry_is_shared() {
    let handle = LevelHandle::new(Severity::Info);
    let resolver = StaticResolver::new();
    resolver.set("TRACING_CONTEXTUAL_IT_GLOBAL", "warn");

    LevelRegistry::global()
        .register_with(&handle, "TRACING_CONTEXTUAL_IT_GLOBAL", resolver)
        .unwrap();
    let again = LevelRegistry::global();
    assert!(again.is_registered(&handle));

    again.refresh();
    assert_eq!(handle.get(), Severity::Warn);
}
