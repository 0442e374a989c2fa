pub mod media;
pub mod memory;
pub mod pg_repo;
pub mod product;
pub mod user;
