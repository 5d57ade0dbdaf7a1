// Authentication and authorization
// Session tokens, password hashing and the admin gate

pub mod admin;
pub mod jwt;
pub mod password;

pub use admin::AdminGate;
