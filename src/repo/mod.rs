//! Target-repository integration: layout profiles, snapshots, change planning
//! and the apply writer.
pub mod apply;
pub mod planner;
pub mod profile;
pub mod snapshot;

pub use apply::{apply_changes, RepoLock};
pub use planner::{plan_changes, ChangeKind, FileChange, RepoChangeSet};
pub use profile::{builtin_profile, builtin_profile_names, default_profile, RepoProfile};
pub use snapshot::{build_snapshot, RepoSnapshot};
