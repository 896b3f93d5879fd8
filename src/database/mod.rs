pub mod connection;
#[cfg(test)]
pub(crate) mod test_utils;

pub use connection::*;
