pub mod health;
pub mod message;
pub mod problem;
pub mod request;
pub mod validation;
