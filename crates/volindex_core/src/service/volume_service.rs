//! Volume administration use-case service.
//!
//! # Responsibility
//! - Register and list volumes, the records import and formatting only read.
//!
//! # Invariants
//! - Accepted volumes pass record validation (`Volume::validate`).
//! - Accepted volumes never share an id or overlap another volume's date
//!   range, keeping date-containment lookups unambiguous.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::model::volume::{Volume, VolumeValidationError};
use crate::repo::index_repo::{IndexRepository, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure while administering volumes.
#[derive(Debug)]
pub enum VolumeAdminError {
    /// The record itself is invalid.
    Invalid(VolumeValidationError),
    /// Another volume already uses this id.
    IdTaken(i64),
    /// The date range intersects another volume's range.
    OverlapsExisting { other_id: i64 },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for VolumeAdminError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::IdTaken(volume_id) => {
                write!(f, "volume id {volume_id} is already registered")
            }
            Self::OverlapsExisting { other_id } => {
                write!(f, "volume date range overlaps existing volume {other_id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for VolumeAdminError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<VolumeValidationError> for VolumeAdminError {
    fn from(value: VolumeValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl From<RepoError> for VolumeAdminError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Volume administration facade over repository implementations.
pub struct VolumeService<R: IndexRepository> {
    repo: R,
}

impl<R: IndexRepository> VolumeService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers one volume after validating it against existing records.
    pub fn add_volume(&mut self, volume: Volume) -> Result<Volume, VolumeAdminError> {
        volume.validate()?;

        if self.repo.find_volume(volume.id)?.is_some() {
            return Err(VolumeAdminError::IdTaken(volume.id));
        }
        for existing in self.repo.list_volumes()? {
            if existing.overlaps(&volume) {
                return Err(VolumeAdminError::OverlapsExisting {
                    other_id: existing.id,
                });
            }
        }

        self.repo.insert_volume(&volume)?;
        info!(
            "event=volume_add module=service status=ok volume={} pages={}",
            volume.id, volume.pages
        );
        Ok(volume)
    }

    /// Lists registered volumes ordered by id.
    pub fn list_volumes(&self) -> Result<Vec<Volume>, VolumeAdminError> {
        Ok(self.repo.list_volumes()?)
    }
}
