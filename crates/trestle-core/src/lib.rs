pub mod client;
pub mod errors;
pub mod mirror;
pub mod model;
pub mod storage;
