pub mod media;
pub mod product;
pub mod user;
