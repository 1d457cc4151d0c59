pub mod calculation;
pub mod lenient;
