use serde::{Deserialize, Serialize};

/// Default flags for every wrapping operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WrappingSettings {
    /// Wrap an aggregate's members rather than its constructor.
    pub apply_to_members: bool,
    /// Skip type-bound and static members when wrapping members.
    pub instance_members_only: bool,
}

impl Default for WrappingSettings {
    fn default() -> Self {
        Self {
            apply_to_members: true,
            instance_members_only: false,
        }
    }
}
