// User domain module
// Identity value objects shared by auth and local claim bookkeeping

pub mod value_objects;

pub use value_objects::{DisplayName, Email, Role};
