pub mod entities;
pub mod events;
pub mod use_cases;
