pub mod error;
pub mod filters;
pub mod model;
pub mod repos;
pub mod service;
