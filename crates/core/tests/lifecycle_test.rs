//! Registry lifecycle runs in its own test binary: teardown clears state
//! every other test relies on.

use mirror_core::{enums, path, registry, scratch};
use mirror_core::{init, is_initialized, teardown, Class, MirrorConfig, MirrorError, Reflect};

#[derive(Debug, Default, Clone, Reflect)]
#[mirror(name = "lifecycle::Engine")]
struct Engine {
    power: u32,
}

#[derive(Debug, Default, Clone, Reflect)]
#[mirror(name = "lifecycle::Car")]
struct Car {
    #[mirror(nested)]
    engine: Engine,
}

fn install_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_init_resolve_teardown() {
    install_subscriber();

    let config = MirrorConfig {
        path_separator: '/',
        ..MirrorConfig::default()
    };
    init(config).unwrap();
    assert!(is_initialized());
    assert!(matches!(
        init(MirrorConfig::default()),
        Err(MirrorError::AlreadyInitialized)
    ));
    assert_eq!(registry::config().path_separator, '/');

    let car = Class::of::<Car>();
    assert_eq!(registry::len(), 2);
    assert!(registry::find_by_name("lifecycle::Engine").is_some());
    assert!(matches!(
        registry::lookup("lifecycle::Boat"),
        Err(MirrorError::ClassNotFound(_))
    ));

    assert_eq!(car.resolve("engine/power").len(), 2);
    assert!(car.resolve("engine.power").is_empty());
    assert_eq!(path::cache_size(), 1);

    let results = path::prefetch(&car, &["engine", "engine/torque"]);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert_eq!(path::cache_size(), 2);

    enums::declare("Gear", "Park, Reverse = -1, Neutral").unwrap();
    assert_eq!(enums::find_declared("Gear").unwrap().values(), &[0, -1, 0]);

    teardown();
    assert!(!is_initialized());
    assert!(registry::is_empty());
    assert_eq!(path::cache_size(), 0);
    assert!(enums::find_declared("Gear").is_none());
    assert!(!scratch::is_occupied());

    // Registering again yields a fresh entry under the default separator
    let again = Class::of::<Car>();
    assert!(!std::sync::Arc::ptr_eq(&car, &again));
    assert_eq!(again.resolve("engine.power").len(), 2);
    assert_eq!(registry::len(), 2);
}
