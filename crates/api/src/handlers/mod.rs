pub mod auth;
pub mod destination;
pub mod destination_image;
pub mod media;
