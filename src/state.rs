//! Shared state captured by one resource's routes.

use crate::resource::{BaseResource, ResourceOptions};
use std::sync::Arc;

#[derive(Clone)]
pub struct ResourceState {
    pub resource: Arc<BaseResource>,
    pub collection: String,
    pub options: Arc<ResourceOptions>,
}
