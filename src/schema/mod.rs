pub mod entity;
pub mod intent_unit;
