pub mod admin;
pub mod chat;
pub mod health;
pub mod identity;
pub mod openapi;
pub mod view;
