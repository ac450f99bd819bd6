//! Flat-directory persistence of key/certificate pairs.
//!
//! Each identity gets `<identity>-key.pem` (0600) and `<identity>.pem`
//! (0644) in a single directory created with mode 0744. Node provisioning
//! copies these files by name, so the layout is fixed.

use std::fs::{DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StoreError;

pub const KEY_FILE_MODE: u32 = 0o600;
pub const CERT_FILE_MODE: u32 = 0o644;
pub const DIR_MODE: u32 = 0o744;

/// Paths written for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedFiles {
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
}

/// Writes key material into a destination directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn key_path(&self, identity: &str) -> PathBuf {
        self.dir.join(format!("{identity}-key.pem"))
    }

    #[must_use]
    pub fn cert_path(&self, identity: &str) -> PathBuf {
        self.dir.join(format!("{identity}.pem"))
    }

    /// Write the key then the certificate for `identity`.
    ///
    /// The two writes are independent: if the certificate write fails the
    /// key file stays behind. An existing pair for the same identity is
    /// overwritten.
    pub fn persist(
        &self,
        identity: &str,
        key_pem: &[u8],
        cert_pem: &[u8],
    ) -> Result<PersistedFiles, StoreError> {
        self.ensure_dir()?;

        let key_path = self.key_path(identity);
        write_file(&key_path, key_pem, KEY_FILE_MODE).map_err(|source| {
            StoreError::FileWrite {
                path: key_path.clone(),
                source,
            }
        })?;

        let cert_path = self.cert_path(identity);
        write_file(&cert_path, cert_pem, CERT_FILE_MODE).map_err(|source| {
            StoreError::FileWrite {
                path: cert_path.clone(),
                source,
            }
        })?;

        debug!(identity = %identity, dir = %self.dir.display(), "wrote key and certificate");
        Ok(PersistedFiles {
            key_path,
            cert_path,
        })
    }

    /// Create the destination directory itself; parents must exist.
    fn ensure_dir(&self) -> Result<(), StoreError> {
        let mut builder = DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(DIR_MODE);
        }
        match builder.create(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(()),
            Err(source) => {
                return Err(StoreError::DirectoryCreation {
                    path: self.dir.clone(),
                    source,
                })
            }
        }

        // The umask applies to `mkdir`; pin the mode on new directories.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.dir, std::fs::Permissions::from_mode(DIR_MODE))
                .map_err(|source| StoreError::DirectoryCreation {
                    path: self.dir.clone(),
                    source,
                })?;
        }
        debug!(dir = %self.dir.display(), "created destination dir");
        Ok(())
    }
}

fn write_file(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)?;

    // The open mode only applies to new files; overwritten files keep
    // whatever mode they had.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;
    Ok(())
}
