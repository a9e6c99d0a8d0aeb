pub mod http;
pub mod rpc;
