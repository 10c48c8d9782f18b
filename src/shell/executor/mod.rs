mod error;
mod executor;
mod launcher;
mod pipe;
mod redirect;
pub mod status;

pub use executor::Executor;
