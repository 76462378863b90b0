pub mod error;
pub mod fanout;
pub mod ports;
pub mod repo;
pub mod service;
