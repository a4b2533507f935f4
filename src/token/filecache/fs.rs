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
//
// SPDX-License-Identifier: Apache-2.0
//! # Filesystem, environment and file-lock capabilities.
//!
//! The file cache touches the world only through these three traits, so the
//! tests can substitute in-memory implementations and the lock stays a
//! swappable advisory primitive.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use fs2::FileExt;

/// The file metadata subset the cache cares about.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileInfo {
    /// Unix permission bits of the file.
    pub mode: u32,
}

/// Filesystem capability.
pub trait Filesystem: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<FileInfo>;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write the file with the given permission bits, atomically replacing
    /// any previous content.
    fn write(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()>;

    fn mkdir_all(&self, path: &Path, mode: u32) -> io::Result<()>;
}

/// Process environment capability.
pub trait Env: Send + Sync {
    /// The value of the variable, empty when unset.
    fn get(&self, key: &str) -> String;

    /// The value of the variable, `None` when unset.
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Advisory file lock capability. Locks are process-scoped and advisory:
/// they coordinate cooperating authenticator processes, nothing else.
pub trait FileLock: Send + Sync {
    /// Try to take the exclusive lock, retrying every `retry_interval`
    /// until `timeout` elapses. `Ok(false)` means the lock stayed
    /// contended for the whole window.
    fn try_lock(&self, timeout: Duration, retry_interval: Duration) -> io::Result<bool>;

    /// Shared-lock variant of [`try_lock`](FileLock::try_lock).
    fn try_read_lock(&self, timeout: Duration, retry_interval: Duration) -> io::Result<bool>;

    fn unlock(&self) -> io::Result<()>;
}

/// Factory producing a lock handle for a path.
pub type LockFactory = dyn Fn(&Path) -> Box<dyn FileLock> + Send + Sync;

/// Real filesystem.
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn stat(&self, path: &Path) -> io::Result<FileInfo> {
        let metadata = fs::metadata(path)?;
        Ok(FileInfo {
            mode: permission_bits(&metadata),
        })
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
        // write-then-rename so readers never observe a partial file
        let temporary = path.with_extension("tmp");
        fs::write(&temporary, data)?;
        set_permission_bits(&temporary, mode)?;
        fs::rename(&temporary, path)
    }

    fn mkdir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        fs::create_dir_all(path)?;
        set_permission_bits(path, mode)
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn permission_bits(_metadata: &fs::Metadata) -> u32 {
    0o600
}

#[cfg(unix)]
fn set_permission_bits(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_permission_bits(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// Real process environment.
pub struct OsEnv;

impl Env for OsEnv {
    fn get(&self, key: &str) -> String {
        std::env::var(key).unwrap_or_default()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Advisory `flock(2)`-style lock over the cache file, opened lazily on the
/// first lock attempt.
pub struct OsFileLock {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl OsFileLock {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            file: Mutex::new(None),
        }
    }

    fn acquire<F>(
        &self,
        timeout: Duration,
        retry_interval: Duration,
        try_once: F,
    ) -> io::Result<bool>
    where
        F: Fn(&File) -> io::Result<()>,
    {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("lock handle poisoned"))?;
        if guard.is_none() {
            *guard = Some(OpenOptions::new().read(true).open(&self.path)?);
        }
        let Some(file) = guard.as_ref() else {
            return Err(io::Error::other("lock handle missing"));
        };

        let deadline = Instant::now() + timeout;
        loop {
            match try_once(file) {
                Ok(()) => return Ok(true),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Ok(false);
                    }
                    std::thread::sleep(retry_interval);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl FileLock for OsFileLock {
    fn try_lock(&self, timeout: Duration, retry_interval: Duration) -> io::Result<bool> {
        self.acquire(timeout, retry_interval, |file| {
            FileExt::try_lock_exclusive(file)
        })
    }

    fn try_read_lock(&self, timeout: Duration, retry_interval: Duration) -> io::Result<bool> {
        self.acquire(timeout, retry_interval, |file| {
            FileExt::try_lock_shared(file)
        })
    }

    fn unlock(&self) -> io::Result<()> {
        let guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("lock handle poisoned"))?;
        match guard.as_ref() {
            Some(file) => FileExt::unlock(file),
            None => Ok(()),
        }
    }
}
