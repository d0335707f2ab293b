//! Error type shared by every capability port.

use thiserror::Error;

/// All errors a capability port can surface.
///
/// Ports translate their native transport failures into these variants so
/// the reconcilers can classify them uniformly (see
/// [`crate::report::attempt`]): ambiguity is a warning, everything else is
/// an error. Nothing here ever aborts a run.
#[derive(Debug, Error)]
pub enum PortError {
    /// The external system could not be reached or answered with a server
    /// fault.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// A declared identity does not resolve to a real external account.
    #[error("unknown identity '{0}'")]
    UnknownIdentity(String),

    /// The referenced group does not exist on the external system.
    #[error("unknown group '{0}'")]
    UnknownGroup(String),

    /// An identity lookup returned multiple matches.
    #[error("ambiguous lookup for '{0}': multiple matches")]
    AmbiguousIdentity(String),

    /// A referenced entity (client, secret path, …) was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The credential in use lacks the needed permission.
    #[error("permission denied: {0}")]
    Denied(String),

    /// The external system answered with something unparseable or otherwise
    /// off-protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Local I/O failure (e.g. a subprocess-backed port).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
