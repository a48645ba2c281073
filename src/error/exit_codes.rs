use crate::error::ForkerError;
use std::io::ErrorKind;

pub fn get_exit_code(error: &ForkerError) -> i32 {
    match error {
        ForkerError::ConfigFile(_) | ForkerError::InvalidConfig(_) => 2,

        ForkerError::InputInspect { source, .. }
        | ForkerError::OpenTarget { source, .. }
        | ForkerError::RelayOpen { source, .. }
            if source.kind() == ErrorKind::PermissionDenied =>
        {
            13
        }

        // Shell conventions: "command not found" and "not executable"
        ForkerError::Exec { source, .. } if source.kind() == ErrorKind::NotFound => 127,
        ForkerError::Exec { .. } => 126,

        _ => 1,
    }
}
