// Domain layer: identifiers, module configuration records and ports.

pub mod conf;
pub mod model;
pub mod ports;
