//! Output formatting for the release tool.
//!
//! Progress lines go to a caller-supplied writer (stderr in the binary) so
//! tests can capture them.

use crate::distributor::DistributionOutcome;
use crate::release::ReleaseReport;
use crate::upload::UploadOutcome;
use std::io::Write;

/// Write a line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format the summary printed after the distribution step.
///
/// # Examples
///
/// ```
/// use meili_releaser::distributor::DistributionOutcome;
/// use meili_releaser::output::distribution_message;
///
/// assert_eq!(distribution_message(&DistributionOutcome::Skipped), None);
/// ```
#[must_use]
pub fn distribution_message(outcome: &DistributionOutcome) -> Option<String> {
    match outcome {
        DistributionOutcome::Skipped => None,
        DistributionOutcome::Published(paths) => {
            let mut message = format!("Published {} build(s) for testing:", paths.len());
            for path in paths {
                message.push_str(&format!("\n  - {path}"));
            }
            Some(message)
        }
    }
}

/// Format a one-line description of an upload outcome.
#[must_use]
pub fn outcome_label(outcome: &UploadOutcome) -> String {
    match outcome {
        UploadOutcome::Uploaded { url } => format!("uploaded ({url})"),
        UploadOutcome::Duplicate => "already published".to_owned(),
        UploadOutcome::Failed { reason } => format!("FAILED: {reason}"),
    }
}

/// Format the summary printed at the end of a release.
#[must_use]
pub fn release_summary(report: &ReleaseReport) -> String {
    let mut summary = format!(
        "Release {}: {} uploaded, {} already published, {} failed",
        report.version,
        report.uploaded(),
        report.duplicates(),
        report.failures()
    );
    for upload in &report.uploads {
        summary.push_str(&format!(
            "\n  - {}: {}",
            upload.artifact.path,
            outcome_label(&upload.outcome)
        ));
    }
    summary
}
