// Domain layer: build model and ports. Toolchains and executors live outside.

pub mod model;
pub mod ports;
