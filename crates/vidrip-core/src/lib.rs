pub mod config;
pub mod logging;

pub mod archive;
pub mod candidates;
pub mod checksum;
pub mod control;
pub mod error;
pub mod model;
pub mod naming;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod reassemble;
pub mod resolver;
pub mod retry;
pub mod save;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;
