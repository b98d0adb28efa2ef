//! Authentication capability consumed by the workflow.

/// Source of truth for whether the current user may run reconciliations.
///
/// Queried once when a session starts.
pub trait Authenticator {
    /// True while the user is signed in.
    fn is_authenticated(&self) -> bool;

    /// Sign the user out.
    fn sign_out(&mut self);
}
