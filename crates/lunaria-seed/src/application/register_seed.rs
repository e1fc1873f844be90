//! RegisterSeedUseCase: turn operator input into a seed registration.
//!
//! A registration fixes the seed id for the lifetime of the device.  Labels
//! are trimmed; the name is mandatory because it is what a client operator
//! picks from the discovery list.

use std::path::PathBuf;

use lunaria_core::{generate_seed_id, SeedIdentity, API_PORT};
use thiserror::Error;

/// Default directory the capture job writes photos into.
pub const DEFAULT_PHOTOS_DIR: &str = "./photos";

/// Error type for registration requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("API port must be non-zero")]
    InvalidPort,
}

/// Operator input for registering a new seed.
#[derive(Debug, Clone, Default)]
pub struct RegistrationRequest {
    pub name: String,
    pub location: String,
    pub owner: String,
    /// API port; defaults to [`API_PORT`].
    pub port: Option<u16>,
    /// Photos directory; defaults to [`DEFAULT_PHOTOS_DIR`].
    pub photos_dir: Option<PathBuf>,
}

/// A validated registration, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRegistration {
    pub identity: SeedIdentity,
    pub photos_dir: PathBuf,
}

/// Validates `request` and assigns a freshly generated seed id.
///
/// # Errors
///
/// Returns [`RegistrationError::EmptyField`] if the name is blank, and
/// [`RegistrationError::InvalidPort`] for port `0`.
pub fn register(request: RegistrationRequest) -> Result<SeedRegistration, RegistrationError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(RegistrationError::EmptyField("name"));
    }
    let port = request.port.unwrap_or(API_PORT);
    if port == 0 {
        return Err(RegistrationError::InvalidPort);
    }

    Ok(SeedRegistration {
        identity: SeedIdentity {
            seed_id: generate_seed_id(),
            name: name.to_string(),
            location: request.location.trim().to_string(),
            owner: request.owner.trim().to_string(),
            port,
        },
        photos_dir: request
            .photos_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PHOTOS_DIR)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegistrationRequest {
        RegistrationRequest {
            name: "  Kitchen Basil ".to_string(),
            location: "Kitchen".to_string(),
            owner: "ada".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_register_applies_defaults() {
        let reg = register(request()).unwrap();
        assert_eq!(reg.identity.port, API_PORT);
        assert_eq!(reg.photos_dir, PathBuf::from(DEFAULT_PHOTOS_DIR));
    }

    #[test]
    fn test_register_trims_labels_and_generates_id() {
        let reg = register(request()).unwrap();
        assert_eq!(reg.identity.name, "Kitchen Basil");
        assert!(reg.identity.seed_id.starts_with("seed-"));
    }

    #[test]
    fn test_register_rejects_blank_name() {
        let req = RegistrationRequest {
            name: "   ".to_string(),
            ..request()
        };
        assert_eq!(register(req), Err(RegistrationError::EmptyField("name")));
    }

    #[test]
    fn test_register_rejects_port_zero() {
        let req = RegistrationRequest {
            port: Some(0),
            ..request()
        };
        assert_eq!(register(req), Err(RegistrationError::InvalidPort));
    }

    #[test]
    fn test_register_allows_empty_location_and_owner() {
        let req = RegistrationRequest {
            location: String::new(),
            owner: String::new(),
            ..request()
        };
        assert!(register(req).is_ok());
    }
}
