pub mod discount;
pub mod errors;
pub mod item_builder;
pub mod lifecycle;
pub mod order;
pub mod ports;
pub mod stock;
