pub mod errors;
pub mod db;
pub mod instance;
pub mod extended_info;
pub mod course_category;
pub mod course;
pub mod course_module;

pub use instance::{InstanceKind, NO_INSTANCE};

#[cfg(test)]
mod tests;
