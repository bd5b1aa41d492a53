//! Feature switches for the player core.

use serde::Deserialize;

/// Per-server player behavior.
///
/// Both switches default to off, which is what most community servers run
/// with: every license counts as complete and the tutorial is skipped.
///
/// Deserializable so it can sit in a JSON config file:
///
/// ```json
/// { "enable_license_requirement": true }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Send the player's real unlocked licenses instead of "all of them".
    pub enable_license_requirement: bool,

    /// Report the stored tutorial state instead of "tutorial complete".
    pub enable_tutorial: bool,
}
