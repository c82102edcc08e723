/// What happens when a descriptor is registered under an id that is already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateIdPolicy {
    /// The last registration wins
    #[default]
    Overwrite,
    /// Registration fails with [crate::KnexError::DuplicateId]
    Reject,
}

/// Settings of a [crate::Registry]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Shown in logs and in parent cycle errors
    pub name: String,
    pub duplicate_ids: DuplicateIdPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: "registry".to_string(),
            duplicate_ids: DuplicateIdPolicy::default(),
        }
    }
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn duplicate_ids(mut self, policy: DuplicateIdPolicy) -> Self {
        self.duplicate_ids = policy;
        self
    }
}
