pub mod admin;
pub mod gateway;
pub mod health;
