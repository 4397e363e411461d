use serde::Deserialize;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Permission {
    #[strum(to_string = "read phone state")]
    ReadPhoneState,
    #[strum(to_string = "coarse location")]
    CoarseLocation,
    /// Requested alongside the others but never required.
    #[strum(to_string = "fine location")]
    FineLocation,
}

/// Grants that must all be present before any metric is measured.
pub const REQUIRED: [Permission; 2] = [Permission::ReadPhoneState, Permission::CoarseLocation];

pub trait Permissions: Send + Sync {
    fn granted(&self, permission: Permission) -> bool;
}

/// Returns the first required permission that has not been granted.
pub fn missing(permissions: &dyn Permissions) -> Option<Permission> {
    REQUIRED.into_iter().find(|p| !permissions.granted(*p))
}

/// Grants declared in the `[permissions]` section of the config.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Grants {
    pub read_phone_state: bool,
    pub coarse_location: bool,
    pub fine_location: bool,
}

impl Grants {
    pub fn all() -> Self {
        Self {
            read_phone_state: true,
            coarse_location: true,
            fine_location: true,
        }
    }
}

impl Permissions for Grants {
    fn granted(&self, permission: Permission) -> bool {
        match permission {
            Permission::ReadPhoneState => self.read_phone_state,
            Permission::CoarseLocation => self.coarse_location,
            Permission::FineLocation => self.fine_location,
        }
    }
}
