pub mod health;
pub mod publisher;
pub mod rbmq;
pub mod tracer;
