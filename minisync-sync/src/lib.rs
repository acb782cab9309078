//! # minisync-sync
//!
//! Decision engine, remote execution bridge and transfer orchestration.
//!
//! Build a [`Session`] over a [`ConfigStore`](minisync_core::ConfigStore) and a
//! [`CommandRunner`] (usually [`SystemRunner`]) and call one operation per
//! invocation: `status`, `load`, `save`, `diff`, `update` or `report_time`.

pub mod decision;
pub mod diff;
pub mod error;
pub mod exec;
pub mod session;
pub mod transfer;

pub use decision::{decide, reconcile, Reconciliation, Verdict};
pub use diff::{classify, ChangeEntry, ChangeKind, DiffReport};
pub use error::{ExecError, SyncError};
pub use exec::{CommandOutput, CommandRunner, RemoteTarget, SystemRunner};
pub use session::{Session, StatusReport, UpdateOutcome};
pub use transfer::{Direction, TransferReport};
