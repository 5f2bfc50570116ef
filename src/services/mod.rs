pub mod graph_service;
pub use graph_service::{GraphService, ResolveError, attach_users};

pub mod graph_service_impl;
pub use graph_service_impl::{CacheAsideGraphService, CachePolicy};
