//! # roster-engine
//!
//! The generic reconciliation core: capability ports, role-aware membership
//! set reconciliation, resource-grant reconciliation, and run-level outcome
//! aggregation.
//!
//! Call [`membership::reconcile_membership`] to converge one group onto a
//! [`membership::MembershipTarget`], or [`grants::reconcile_grants`] for
//! resource grants. Both are parameterized by a capability port and are
//! used identically by every service synchronizer.

pub mod error;
pub mod grants;
pub mod membership;
pub mod ports;
pub mod report;

pub use error::PortError;
pub use grants::{reconcile_grants, GrantOutcome};
pub use membership::{reconcile_membership, GroupOutcome, MembershipTarget, ReconcilePolicy};
pub use ports::{
    ChannelPort, GrantPort, GroupRef, GroupSpec, Identity, MembershipPort, Permission, Resource,
    Role, SecretBundle, SecretStorePort,
};
pub use report::{attempt, RunReport};
