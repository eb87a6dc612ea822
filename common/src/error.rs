use std::backtrace::BacktraceStatus;

use anyhow::Error;
use simplelog::error;

pub struct FancyError();

impl FancyError {
    /// Logs `error` with its whole cause chain and, if captured, the backtrace.
    pub fn print_fancy(error: &Error, critical: bool) {
        if critical {
            error!("A fatal error occurred, postmarks cannot continue and will exit.");
        } else {
            error!("An error occurred, postmarks keeps running but may not behave as expected.");
        }

        error!("Error: {}", error);
        for cause in error.chain().skip(1) {
            error!("    Caused by: {}", cause);
        }

        if error.backtrace().status() == BacktraceStatus::Captured {
            error!("Backtrace:");
            for line in error.backtrace().to_string().lines() {
                error!("{}", line);
            }
        } else {
            error!("Run with `RUST_BACKTRACE=1` to include a backtrace in this report.");
        }
    }
}
