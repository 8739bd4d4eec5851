#![doc = include_str!("../README.md")]

pub mod controller;
pub mod driver;
pub mod error;
pub mod page;
pub mod session;
pub mod transport;

pub use error::{ClientError, Result};
