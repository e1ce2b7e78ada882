pub mod assistant;
pub mod chat;
pub mod lifecycle;
pub mod orders;
pub mod pricing;
pub mod stats;
pub mod users;
