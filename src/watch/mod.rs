//! Watch entities and the diff engine that drives them.

mod diff;
mod notifier;
mod watch;
pub use diff::*;
pub use notifier::*;
pub use watch::*;

#[cfg(test)]
mod diff_test;
