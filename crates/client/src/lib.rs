pub mod api;
pub mod channel;
pub mod error;
pub mod gateway;
pub mod model;
