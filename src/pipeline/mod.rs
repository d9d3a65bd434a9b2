pub mod persistence;
pub mod project;
pub mod schedule;
pub mod transport;
