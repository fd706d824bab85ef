// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the error types of the resource system.
//!
//! There are two families, and they travel very differently:
//! - [`LoadError`] is reported by a loader. It never fails a load call; it is
//!   handed to the active error callback and the offending key is evicted.
//! - [`ResourceError`] is a programming mistake (e.g. an unregistered loader)
//!   and is returned to the caller as `Err`.

use crate::{loader::LoaderId, resource::ResourceKey};
use thiserror::Error;

/// A failure reported by a loader for a single path.
///
/// `Clone` so that every waiter on a shared in-flight load can observe it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Nothing exists at the requested path.
    #[error("Resource not found at '{path}'")]
    NotFound {
        /// The path that was requested.
        path: ResourceKey,
    },
    /// The raw bytes could not be fetched (network, disk, permissions...).
    #[error("Failed to fetch '{path}': {message}")]
    Fetch {
        /// The path that was requested.
        path: ResourceKey,
        /// The underlying I/O or transport error.
        message: String,
    },
    /// The bytes were fetched but could not be decoded.
    #[error("Failed to decode '{path}': {message}")]
    Decode {
        /// The path that was requested.
        path: ResourceKey,
        /// Details from the decoder.
        message: String,
    },
}

impl LoadError {
    /// Shorthand for [`LoadError::NotFound`].
    pub fn not_found(path: impl Into<ResourceKey>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Shorthand for [`LoadError::Fetch`] from any displayable source error.
    pub fn fetch(path: impl Into<ResourceKey>, source: impl std::fmt::Display) -> Self {
        Self::Fetch {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Shorthand for [`LoadError::Decode`] from any displayable source error.
    pub fn decode(path: impl Into<ResourceKey>, source: impl std::fmt::Display) -> Self {
        Self::Decode {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// The path whose load failed.
    pub fn path(&self) -> &ResourceKey {
        match self {
            LoadError::NotFound { path }
            | LoadError::Fetch { path, .. }
            | LoadError::Decode { path, .. } => path,
        }
    }
}

/// Misuse of the resource system, returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// No factory has been registered under this loader id.
    #[error("No loader registered for id '{0}'")]
    UnknownLoader(LoaderId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_messages() {
        let err = LoadError::decode("mesh.obj", "unexpected token at line 3");
        assert_eq!(
            err.to_string(),
            "Failed to decode 'mesh.obj': unexpected token at line 3"
        );
        assert_eq!(err.path().as_str(), "mesh.obj");

        let err = LoadError::not_found("missing.png");
        assert_eq!(err.to_string(), "Resource not found at 'missing.png'");
    }

    #[test]
    fn test_fetch_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = LoadError::fetch("secret.bin", io);
        assert!(matches!(err, LoadError::Fetch { ref message, .. } if message == "denied"));
    }

    #[test]
    fn test_unknown_loader_message() {
        let err = ResourceError::UnknownLoader(LoaderId::new("gltf"));
        assert_eq!(err.to_string(), "No loader registered for id 'gltf'");
    }
}
