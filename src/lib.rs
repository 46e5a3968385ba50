pub mod app;
pub mod config;
pub mod domain;
pub mod infra;
pub mod logging;
pub mod ui;
pub mod usecase;

#[cfg(test)]
mod tests;
