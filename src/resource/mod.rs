//! Generic resource pipeline: data access over a document store and the
//! endpoint builder that exposes it per collection.

pub mod base;
pub mod builder;
pub mod options;

pub use base::BaseResource;
pub use builder::build;
pub use options::{ActionOverride, ErrorHook, ResourceOptions, ResourceRequest, SuccessHook};
