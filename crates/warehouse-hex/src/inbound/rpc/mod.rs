mod server;

pub use server::{RpcServer, RpcServerConfig};
