//! REST API handlers

pub mod credits;
pub mod health;
pub mod payments;
pub mod shared;
pub mod subscription;
pub mod webhook;

pub use credits::*;
pub use health::*;
pub use payments::*;
pub use subscription::*;
pub use webhook::*;
