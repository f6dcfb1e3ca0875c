pub mod interest;
pub mod message;
pub mod profile;
pub mod profile_view;
pub mod saved_profile;
pub mod user;
