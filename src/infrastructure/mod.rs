pub mod auth;
pub mod bus;
pub mod db;
pub mod http;
pub mod storage;
