//! Provisioning step taxonomy.
//!
//! A closed, totally-ordered set of workflow steps plus a distinguished
//! `Failed` sentinel that sits outside the normal ordering. Producers send
//! the step as a plain ordinal on the wire; unknown ordinals decode to
//! [`ProvisioningStep::Initializing`] so that newer servers degrade
//! gracefully on older clients instead of crashing them.

use serde::{Deserialize, Serialize};

/// Ordinal used for the `Failed` sentinel on the wire.
pub const FAILED_ORDINAL: i32 = 99;

/// Number of steps on the normal provisioning path (Initializing..=Completed).
pub const TOTAL_STEPS: usize = 8;

/// One step of the tenant provisioning workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProvisioningStep {
    /// Workflow accepted, nothing provisioned yet
    Initializing,
    /// Database/schema infrastructure is being created
    CreatingInfrastructure,
    /// Schema migrations are running
    RunningMigrations,
    /// Seed data is being inserted
    SeedingData,
    /// Purchased modules are being configured
    ConfiguringModules,
    /// Storage quota is being allocated
    AllocatingStorage,
    /// Tenant is being activated
    Activating,
    /// Workflow finished successfully (terminal)
    Completed,
    /// Workflow failed (terminal, outside the normal ordering)
    Failed,
}

impl ProvisioningStep {
    /// Decode a wire ordinal, falling back to `Initializing` for anything
    /// this client does not recognize.
    #[must_use]
    pub fn from_ordinal(ordinal: i32) -> Self {
        match ordinal {
            0 => Self::Initializing,
            1 => Self::CreatingInfrastructure,
            2 => Self::RunningMigrations,
            3 => Self::SeedingData,
            4 => Self::ConfiguringModules,
            5 => Self::AllocatingStorage,
            6 => Self::Activating,
            7 => Self::Completed,
            FAILED_ORDINAL => Self::Failed,
            _ => Self::Initializing,
        }
    }

    /// Wire ordinal of this step.
    #[must_use]
    pub fn ordinal(self) -> i32 {
        match self {
            Self::Initializing => 0,
            Self::CreatingInfrastructure => 1,
            Self::RunningMigrations => 2,
            Self::SeedingData => 3,
            Self::ConfiguringModules => 4,
            Self::AllocatingStorage => 5,
            Self::Activating => 6,
            Self::Completed => 7,
            Self::Failed => FAILED_ORDINAL,
        }
    }

    /// Human-readable label for display.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::CreatingInfrastructure => "Creating infrastructure",
            Self::RunningMigrations => "Running migrations",
            Self::SeedingData => "Seeding data",
            Self::ConfiguringModules => "Configuring modules",
            Self::AllocatingStorage => "Allocating storage",
            Self::Activating => "Activating",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }

    /// Whether no further state-changing transition is meaningful.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}
