use std::io;
use std::path::Path;
use std::process::Command;

use crate::attributes::Visibility;
use crate::error::{FilesystemError, Result};
use crate::visibility::{PortableVisibilityConverter, VisibilityConverter};

/// SID of the built-in Guests group.
pub const GUESTS_SID: &str = "S-1-5-32-546";
const GUESTS_ACCOUNT: &str = "BUILTIN\\Guests";

/// Native permission handling for the local adapter, chosen once per host.
#[derive(Debug, Clone)]
pub enum PermissionStrategy {
    Unix(UnixPermissions),
    Windows(WindowsPermissions),
}

impl PermissionStrategy {
    /// Picks the variant matching the host platform.
    pub fn for_current_os() -> io::Result<Self> {
        if cfg!(unix) {
            Ok(Self::Unix(UnixPermissions::default()))
        } else if cfg!(windows) {
            Ok(Self::Windows(WindowsPermissions::default()))
        } else {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "unsupported platform: only unix and windows hosts carry file permissions",
            ))
        }
    }

    pub fn set_file_visibility(
        &self,
        native: &Path,
        location: &str,
        visibility: Visibility,
    ) -> Result<()> {
        match self {
            Self::Unix(unix) => unix.set_file_visibility(native, visibility),
            Self::Windows(windows) => windows.set_file_visibility(native, visibility),
        }
        .map_err(|e| FilesystemError::set_visibility(location, e))
    }

    pub fn set_directory_visibility(
        &self,
        native: &Path,
        location: &str,
        visibility: Visibility,
    ) -> Result<()> {
        match self {
            Self::Unix(unix) => unix.set_directory_visibility(native, visibility),
            Self::Windows(windows) => windows.set_directory_visibility(native, visibility),
        }
        .map_err(|e| FilesystemError::set_visibility(location, e))
    }

    pub fn file_visibility(&self, native: &Path) -> io::Result<Visibility> {
        match self {
            Self::Unix(unix) => unix.file_visibility(native),
            Self::Windows(windows) => windows.visibility(native),
        }
    }

    pub fn directory_visibility(&self, native: &Path) -> io::Result<Visibility> {
        match self {
            Self::Unix(unix) => unix.directory_visibility(native),
            Self::Windows(windows) => windows.visibility(native),
        }
    }
}

/// POSIX mode bits driven by a [`PortableVisibilityConverter`].
///
/// Reading back compares against the public mode, so anything at least as
/// permissive as the public threshold reads as public.
#[derive(Debug, Clone, Default)]
pub struct UnixPermissions {
    converter: PortableVisibilityConverter,
}

impl UnixPermissions {
    pub fn new(converter: PortableVisibilityConverter) -> Self {
        Self { converter }
    }

    pub fn converter(&self) -> &PortableVisibilityConverter {
        &self.converter
    }

    pub fn set_file_visibility(&self, native: &Path, visibility: Visibility) -> io::Result<()> {
        set_mode(native, self.converter.for_file(visibility))
    }

    pub fn set_directory_visibility(&self, native: &Path, visibility: Visibility) -> io::Result<()> {
        set_mode(native, self.converter.for_directory(visibility))
    }

    pub fn file_visibility(&self, native: &Path) -> io::Result<Visibility> {
        let threshold = self.converter.for_file(Visibility::Public);
        Ok(visibility_from_mode(read_mode(native)?, threshold))
    }

    pub fn directory_visibility(&self, native: &Path) -> io::Result<Visibility> {
        let threshold = self.converter.for_directory(Visibility::Public);
        Ok(visibility_from_mode(read_mode(native)?, threshold))
    }
}

fn visibility_from_mode(mode: u32, public_threshold: u32) -> Visibility {
    if mode & 0o777 >= public_threshold {
        Visibility::Public
    } else {
        Visibility::Private
    }
}

#[cfg(unix)]
fn set_mode(native: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(native, std::fs::Permissions::from_mode(mode))
}

#[cfg(unix)]
fn read_mode(native: &Path) -> io::Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    Ok(std::fs::metadata(native)?.permissions().mode())
}

#[cfg(not(unix))]
fn set_mode(_native: &Path, _mode: u32) -> io::Result<()> {
    Err(unix_only())
}

#[cfg(not(unix))]
fn read_mode(_native: &Path) -> io::Result<u32> {
    Err(unix_only())
}

#[cfg(not(unix))]
fn unix_only() -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, "mode bits are only available on unix hosts")
}

/// Windows ACLs: a private entry is a full-control deny rule for one
/// identity, applied and inspected through `icacls`.
#[derive(Debug, Clone)]
pub struct WindowsPermissions {
    sid: String,
    account: String,
}

impl Default for WindowsPermissions {
    fn default() -> Self {
        Self::new(GUESTS_SID, GUESTS_ACCOUNT)
    }
}

impl WindowsPermissions {
    /// `sid` is used when granting and revoking; `account` is the name
    /// `icacls` prints for it when listing.
    pub fn new(sid: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            account: account.into(),
        }
    }

    pub fn set_file_visibility(&self, native: &Path, visibility: Visibility) -> io::Result<()> {
        self.apply(native, visibility, "(F)")
    }

    pub fn set_directory_visibility(&self, native: &Path, visibility: Visibility) -> io::Result<()> {
        self.apply(native, visibility, "(OI)(CI)(F)")
    }

    pub fn visibility(&self, native: &Path) -> io::Result<Visibility> {
        let output = icacls(native, &[])?;
        Ok(self.parse_visibility(&output))
    }

    /// Private when the listing holds a full-control deny entry for the
    /// configured account.
    pub fn parse_visibility(&self, icacls_output: &str) -> Visibility {
        let account = self.account.to_lowercase();
        let denied = icacls_output.lines().any(|line| {
            let line = line.to_lowercase();
            line.split_whitespace().any(|entry| {
                entry
                    .strip_prefix(&account)
                    .and_then(|rest| rest.strip_prefix(':'))
                    .is_some_and(|rights| rights.contains("(deny)") && rights.contains("(f)"))
            })
        });

        if denied {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    fn apply(&self, native: &Path, visibility: Visibility, rights: &str) -> io::Result<()> {
        let identity = format!("*{}", self.sid);
        match visibility {
            Visibility::Private => {
                icacls(native, &["/deny", &format!("{identity}:{rights}")])?;
            }
            Visibility::Public => {
                icacls(native, &["/remove:d", &identity])?;
            }
        }
        Ok(())
    }
}

fn icacls(native: &Path, args: &[&str]) -> io::Result<String> {
    let output = Command::new("icacls").arg(native).args(args).output()?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(io::Error::other(format!(
            "icacls exited with {}: {}",
            output.status,
            if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() }
        )));
    }
    Ok(stdout)
}
