pub mod student_client;

pub use student_client::{StudentClient, UpstreamError};
