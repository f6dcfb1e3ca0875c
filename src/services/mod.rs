pub mod auth;
pub mod jwt;
pub mod oauth;
pub mod registration;
