//! 应用层

pub mod health;
pub mod product;
pub mod state;
