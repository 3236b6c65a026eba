/// Router Module Index
///
/// Splits routing by concern so each group can carry its own layers.

/// Service-level routes (health). No state, no checks.
pub mod public;

/// Editor gate routes. Each request is checked against the gate's stored credential.
pub mod editor;
