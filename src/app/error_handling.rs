//! Fatal error reporting for the command line tool

use crate::error::PublishError;
use crate::storage::StorageError;
use tracing::error;

/// Exit code for an error that reached `main`
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    if let Some(publish_err) = error.downcast_ref::<PublishError>() {
        publish_err.exit_code()
    } else if error.downcast_ref::<StorageError>().is_some() {
        4
    } else {
        1
    }
}

/// Report a fatal error and exit.
///
/// With `verbose >= 1` the full error chain is printed as well.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);
    eprintln!("Error: {error}");

    if let Some(publish_err) = error.downcast_ref::<PublishError>() {
        if publish_err.may_leave_orphans() {
            eprintln!("Partition artifacts written before the failure were left in storage.");
        }
    }

    if verbose >= 1 {
        eprintln!("\nError chain:");
        for (i, cause) in error.chain().enumerate() {
            eprintln!("  {}: {}", i, cause);
        }
    }

    std::process::exit(exit_code_for(&error))
}
