//! Errors surfaced while building candidates and requirements.

use thiserror::Error;

use crate::request::Link;

/// Error returned by a [`MetadataPreparer`](crate::MetadataPreparer).
pub type PrepareError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that may occur while feeding the resolver.
///
/// Unsatisfiable constraints are *not* reported through this type while the
/// graph is being built: they are modelled as
/// [`NoMatchRequirement`](crate::NoMatchRequirement) values and only turn
/// into [`ResolveError::Unsatisfiable`] once the solver gives up.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A requirement string could not be parsed.
    #[error("invalid requirement {spec:?} (from {origin}): {message}")]
    InvalidRequirement {
        /// The raw requirement string.
        spec: String,
        /// The install request that declared it.
        origin: String,
        /// Parser diagnostic.
        message: String,
    },

    /// The metadata pipeline failed for a link.
    #[error("failed to prepare metadata for {link}")]
    Metadata {
        /// The link being prepared.
        link: Link,
        /// Error raised by the preparer.
        #[source]
        source: PrepareError,
    },

    /// Prepared metadata disagrees with what the index advertised.
    #[error("metadata for {link} has {field} {found}, expected {expected}")]
    InconsistentMetadata {
        /// The link being prepared.
        link: Link,
        /// `"name"` or `"version"`.
        field: &'static str,
        /// Value advertised before preparation.
        expected: String,
        /// Value found in the prepared metadata.
        found: String,
    },

    /// The solver proved that no assignment satisfies the requests.
    #[error("{0}")]
    Unsatisfiable(String),

    /// The solver was cancelled without a recorded cause.
    #[error("resolution was cancelled")]
    Cancelled,
}
