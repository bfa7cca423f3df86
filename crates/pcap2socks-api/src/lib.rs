// pcap2socks-api: Typed command surface and transport for the pcap2socks backend

pub mod backend;
pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use backend::Backend;
pub use client::HttpBackend;
pub use error::Error;
pub use transport::TransportConfig;
pub use types::{
    Command, InterfaceInfo, NatType, Request, Response, RunPayload, RunResponse, StatusResponse,
    TestPayload, TestResponse,
};
