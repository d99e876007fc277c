// Domain layer: tables, analysis outputs and the ports the pipelines talk through.

pub mod model;
pub mod ports;
