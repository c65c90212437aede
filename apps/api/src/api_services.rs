mod redis;
mod state_builder;

pub use state_builder::{AdmissionStores, AppRuntime, build_app_runtime};
