//! warehouse-types: domain model and ports shared by core and adapters.

pub mod domain;
pub mod ports;
