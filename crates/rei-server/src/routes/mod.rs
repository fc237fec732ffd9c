pub mod activity;
pub mod auth;
pub mod commands;
pub mod health;
pub mod slack;
