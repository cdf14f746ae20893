//! Shop domain module

mod entity;
mod repository;

pub use entity::*;
pub use repository::*;
