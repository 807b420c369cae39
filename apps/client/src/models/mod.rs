pub mod application;
pub mod cover_letter;
pub mod cv;
pub mod photo;
pub mod subscription;
pub mod user;
