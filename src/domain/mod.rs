// Domain layer: coordinate models and the ports implemented by the geodesy adapter.

pub mod model;
pub mod ports;
