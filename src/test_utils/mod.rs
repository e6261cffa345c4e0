//! the test_utils folder here will share utils or test components between
//! unit tests
mod receiver;
pub use receiver::*;

use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

static LOGGER_INIT: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    Lazy::force(&LOGGER_INIT);
    println!("setup logger for unit test.");
}
