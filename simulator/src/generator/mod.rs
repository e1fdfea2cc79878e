pub mod classes;
pub mod profile;
