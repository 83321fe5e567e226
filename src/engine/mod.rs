pub mod indicators;
pub mod navigator;
