pub mod extractors;
pub mod media;
pub mod products;
pub mod users;
