pub mod admin;
pub mod errors;
pub mod openapi;
pub mod remote;
pub mod routes;
pub mod startup;
pub mod state;

pub use startup::run;
