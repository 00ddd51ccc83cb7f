mod bootstrap;
mod init;

pub use bootstrap::{BootstrapOutcome, bootstrap, cmd_bootstrap};
pub use init::cmd_init;
