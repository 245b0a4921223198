//! Helpers shared by unit tests, integration tests and benches
use crate::context::{BuildContext, Configuration, Platform};
use crate::declaration::ModuleDeclaration;
use crate::store::DeclarationStore;
use crate::targets::TargetType;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests, once per process.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither set no
/// subscriber is installed.
///
/// ```bash
/// RUST_LOG=strata_build=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Win64 / Development / Game
pub fn win64_game() -> BuildContext {
    BuildContext::new(Platform::Win64, Configuration::Development, TargetType::Game)
}

/// Store holding every declaration, panicking on registration errors
pub fn store_of(declarations: impl IntoIterator<Item = ModuleDeclaration>) -> DeclarationStore {
    let mut store = DeclarationStore::new();
    store
        .register_all(declarations)
        .expect("test declarations should register");
    store
}
