pub mod config;
pub mod matrix;
pub mod tau;
