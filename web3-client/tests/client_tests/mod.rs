//! Integration tests for the chain client contract and the alloy adapter

use std::sync::Once;

use tracing_subscriber::EnvFilter;

mod adapter_tests;

static INIT: Once = Once::new();

/// Install a test subscriber once per test binary
pub fn init_logger() {
    INIT.call_once(|| {
        let filter = EnvFilter::from_default_env()
            .add_directive("web3_client=debug".parse().unwrap())
            .add_directive("actix_web=error".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}
