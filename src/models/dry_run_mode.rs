/// Defines the dry-run behavior mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DryRunMode {
    /// Normal operation - actually copy files and update the state file
    None,

    /// Quick preview - skip hashing entirely
    /// Shows what would be backed up based on last modified dates only
    Quick,

    /// Full simulation - perform all checks including hashing but skip file copy and state writes
    /// Shows exactly what would happen in a real backup
    Full,
}

impl DryRunMode {
    /// Returns true if this is any dry-run mode (Quick or Full)
    pub fn is_dry_run(&self) -> bool {
        matches!(self, DryRunMode::Quick | DryRunMode::Full)
    }

    /// Returns true if content hashing may be performed
    pub fn should_hash(&self) -> bool {
        !matches!(self, DryRunMode::Quick)
    }

    /// Returns true if files should actually be copied
    pub fn should_copy_files(&self) -> bool {
        matches!(self, DryRunMode::None)
    }

    /// Returns true if the state store should be written
    pub fn should_update_state(&self) -> bool {
        matches!(self, DryRunMode::None)
    }

    /// Get display string for progress bars
    pub fn progress_prefix(&self) -> &'static str {
        match self {
            DryRunMode::None => "",
            DryRunMode::Quick => "[DRY RUN - QUICK] ",
            DryRunMode::Full => "[DRY RUN - FULL] ",
        }
    }
}
