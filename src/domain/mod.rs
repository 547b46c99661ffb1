// Domain layer: report model and the accessor ports. Store clients live in `adapters`.

pub mod model;
pub mod ports;
