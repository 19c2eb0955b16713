pub mod result;
pub mod universe;
