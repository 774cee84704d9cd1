// Domain layer: models and ports. Adapters implement the ports against real services.

pub mod model;
pub mod ports;
