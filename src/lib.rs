pub mod config;
pub mod db;
pub mod domain;
pub mod paths;
pub mod session;
pub mod srs;
pub mod validation;

#[cfg(test)]
pub mod testing;
