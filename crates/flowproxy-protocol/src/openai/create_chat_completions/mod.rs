pub mod request;
pub mod stream;
pub mod types;
