use std::process::ExitCode;

use collector_engine::{AppViewModel, Failure, FailureOrigin, Phase};

pub const EXIT_FAILED: u8 = 1;
pub const EXIT_QUOTA: u8 = 2;
pub const EXIT_INTERRUPTED: u8 = 130;

/// Prints a settled view: the result JSON on stdout, or the failure on stderr.
pub fn report(view: &AppViewModel) -> ExitCode {
    match (view.phase, &view.result, &view.failure) {
        (Phase::Completed, Some(result), _) => {
            match serde_json::to_string_pretty(result.data()) {
                Ok(json) => println!("{json}"),
                Err(_) => println!("{}", result.data()),
            }
        }
        (Phase::Failed, _, Some(failure)) => eprintln!("{}", describe(failure)),
        _ => eprintln!("Job abandoned before it settled"),
    }
    ExitCode::from(exit_status(view))
}

/// One line for stderr, led by what went wrong.
pub fn describe(failure: &Failure) -> String {
    if failure.is_quota_exceeded() {
        return format!("Quota exceeded: {}", failure.message);
    }
    let lead = match failure.origin {
        FailureOrigin::InvalidInput => "Invalid input",
        FailureOrigin::Submission => "Submission failed",
        FailureOrigin::StatusQuery => "Status check failed",
        FailureOrigin::Job => "Extraction failed",
        FailureOrigin::Cancelled => "Cancelled",
        FailureOrigin::DeadlineExceeded => "Timed out",
    };
    format!("{lead}: {}", failure.message)
}

pub fn exit_status(view: &AppViewModel) -> u8 {
    match (view.phase, &view.failure) {
        (Phase::Completed, _) if view.result.is_some() => 0,
        (Phase::Failed, Some(failure)) if failure.is_quota_exceeded() => EXIT_QUOTA,
        _ => EXIT_FAILED,
    }
}
