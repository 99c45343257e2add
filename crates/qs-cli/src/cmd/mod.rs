pub mod config;
pub mod project;
pub mod story;
pub mod sync;

use qs_core::story::{BranchOutcome, TeardownOutcome};
use qs_core::sync::SyncOutcome;

pub(crate) fn sync_status(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Synced => "synced".to_string(),
        SyncOutcome::Skipped { branch } => format!("skipped (on {branch})"),
        SyncOutcome::Failed { reason } => format!("failed: {reason}"),
    }
}

pub(crate) fn branch_status(outcome: &BranchOutcome) -> String {
    match outcome {
        BranchOutcome::Created => "branched".to_string(),
        BranchOutcome::Declined { branch } => format!("left on {branch}"),
        BranchOutcome::Failed { reason } => format!("failed: {reason}"),
    }
}

pub(crate) fn teardown_status(outcome: &TeardownOutcome) -> String {
    match outcome {
        TeardownOutcome::Removed { branch } => format!("deleted {branch}"),
        TeardownOutcome::Skipped { branch } => format!("left on {branch}"),
        TeardownOutcome::Failed { reason } => format!("failed: {reason}"),
    }
}
