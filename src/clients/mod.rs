pub mod placeholder;

pub use placeholder::{PlaceholderClient, UpstreamError};
