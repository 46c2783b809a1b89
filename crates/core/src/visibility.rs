use std::collections::HashMap;

use crate::attributes::Visibility;

/// Bidirectional mapping between [`Visibility`] and a backend's native
/// permission model. Reading back never fails: anything that does not map to
/// a known private state is reported as public.
pub trait VisibilityConverter {
    /// What gets applied to the backend.
    type Native;
    /// What the backend reports back.
    type Observed: ?Sized;

    fn for_file(&self, visibility: Visibility) -> Self::Native;

    fn for_directory(&self, visibility: Visibility) -> Self::Native;

    fn inverse_for_file(&self, observed: &Self::Observed) -> Visibility;

    fn inverse_for_directory(&self, observed: &Self::Observed) -> Visibility;

    fn default_for_directories(&self) -> Visibility;
}

pub const FILE_PUBLIC: u32 = 0o644;
pub const FILE_PRIVATE: u32 = 0o600;
pub const DIRECTORY_PUBLIC: u32 = 0o755;
pub const DIRECTORY_PRIVATE: u32 = 0o700;

/// POSIX mode-bit converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortableVisibilityConverter {
    file_public: u32,
    file_private: u32,
    directory_public: u32,
    directory_private: u32,
    default_for_directories: Visibility,
}

impl Default for PortableVisibilityConverter {
    fn default() -> Self {
        Self::new(
            FILE_PUBLIC,
            FILE_PRIVATE,
            DIRECTORY_PUBLIC,
            DIRECTORY_PRIVATE,
            Visibility::Private,
        )
    }
}

impl PortableVisibilityConverter {
    pub fn new(
        file_public: u32,
        file_private: u32,
        directory_public: u32,
        directory_private: u32,
        default_for_directories: Visibility,
    ) -> Self {
        Self {
            file_public,
            file_private,
            directory_public,
            directory_private,
            default_for_directories,
        }
    }

    /// Builds a converter from a `{"file"|"dir": {"public"|"private": mode}}`
    /// map. Missing entries fall back to the standard modes.
    pub fn from_permission_map(
        map: &HashMap<String, HashMap<String, u32>>,
        default_for_directories: Visibility,
    ) -> Self {
        let lookup = |kind: &str, visibility: &str, fallback: u32| {
            map.get(kind)
                .and_then(|modes| modes.get(visibility))
                .copied()
                .unwrap_or(fallback)
        };
        Self::new(
            lookup("file", "public", FILE_PUBLIC),
            lookup("file", "private", FILE_PRIVATE),
            lookup("dir", "public", DIRECTORY_PUBLIC),
            lookup("dir", "private", DIRECTORY_PRIVATE),
            default_for_directories,
        )
    }

    /// Mode for freshly created directories.
    pub fn default_directory_mode(&self) -> u32 {
        self.for_directory(self.default_for_directories)
    }
}

impl VisibilityConverter for PortableVisibilityConverter {
    type Native = u32;
    type Observed = u32;

    fn for_file(&self, visibility: Visibility) -> u32 {
        match visibility {
            Visibility::Public => self.file_public,
            Visibility::Private => self.file_private,
        }
    }

    fn for_directory(&self, visibility: Visibility) -> u32 {
        match visibility {
            Visibility::Public => self.directory_public,
            Visibility::Private => self.directory_private,
        }
    }

    fn inverse_for_file(&self, mode: &u32) -> Visibility {
        if *mode == self.file_private {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    fn inverse_for_directory(&self, mode: &u32) -> Visibility {
        if *mode == self.directory_private {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    fn default_for_directories(&self) -> Visibility {
        self.default_for_directories
    }
}
