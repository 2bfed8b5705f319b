// Domain layer: record models, lookup tables and ports. Only std/serde/csv here.

pub mod model;
pub mod ports;
pub mod reference;
pub mod table;
