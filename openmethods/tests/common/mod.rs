//! Shared helpers for integration tests.

#![allow(dead_code)]

use openmethods::{RebuildOptions, UnknownClassPolicy};
use tracing_subscriber::EnvFilter;

/// Declare a unit struct implementing `Class` with the given direct bases.
macro_rules! class {
    ($name:ident) => {
        struct $name;
        impl ::openmethods::Class for $name {}
    };
    ($name:ident : $($base:ident),+) => {
        struct $name;
        impl ::openmethods::Class for $name {
            fn direct_bases() -> Vec<::std::any::TypeId> {
                vec![$(::std::any::TypeId::of::<$base>()),+]
            }
        }
    };
}

/// Options returning unknown-class errors instead of panicking.
pub fn options() -> RebuildOptions {
    RebuildOptions::default().with_unknown_class(UnknownClassPolicy::Error)
}

/// Route library logs to the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
