pub mod media;
pub mod products;
pub mod system;
pub mod users;
