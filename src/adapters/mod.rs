// Adapters layer: concrete implementations for external systems (geodesy library, http).

pub mod http;
pub mod proj;
