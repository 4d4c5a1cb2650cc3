//! Confirmation capability for the mutation gate.
//!
//! The gate never writes without an explicit approval. The provider is
//! injected so tests can swap in auto-approve/auto-deny doubles, and
//! non-interactive dispatch paths can declare that no channel exists.

use async_trait::async_trait;
use std::io::Write;

/// Outcome of asking the operator about a proposed edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Approved,
    Denied,
    /// No confirmation channel is available; the edit degrades to
    /// preview-only and must not be applied.
    Unavailable,
}

#[async_trait]
pub trait ConfirmationProvider: Send + Sync {
    async fn confirm(&self, diff: &str) -> Confirmation;
}

/// Interactive console prompt. Only an explicit `y`/`yes` (case-insensitive)
/// approves; any other input cancels.
pub struct ConsoleConfirmation;

#[async_trait]
impl ConfirmationProvider for ConsoleConfirmation {
    async fn confirm(&self, diff: &str) -> Confirmation {
        println!("EDIT PREVIEW:\n{}", diff);
        print!("Apply this change? (yes/no) ");
        if std::io::stdout().flush().is_err() {
            return Confirmation::Denied;
        }

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err() {
            return Confirmation::Denied;
        }

        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => Confirmation::Approved,
            _ => Confirmation::Denied,
        }
    }
}

/// Approves every edit without prompting. Test double.
pub struct AutoApprove;

#[async_trait]
impl ConfirmationProvider for AutoApprove {
    async fn confirm(&self, _diff: &str) -> Confirmation {
        Confirmation::Approved
    }
}

/// Denies every edit without prompting. Test double.
pub struct AutoDeny;

#[async_trait]
impl ConfirmationProvider for AutoDeny {
    async fn confirm(&self, _diff: &str) -> Confirmation {
        Confirmation::Denied
    }
}

/// No confirmation channel: edits stay preview-only.
pub struct NoChannel;

#[async_trait]
impl ConfirmationProvider for NoChannel {
    async fn confirm(&self, _diff: &str) -> Confirmation {
        Confirmation::Unavailable
    }
}
