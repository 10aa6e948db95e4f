//! UDP transport: socket construction and the request/response client.

pub mod client;
pub mod socket;

pub use client::{ClientOptions, TransportClient};
pub use socket::{bind_receiver, create_reusable_socket};
