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
//! # Credential file cache.
//!
//! On-disk cache of expiring AWS credentials, shared by concurrent client
//! invocations and keyed by `(cluster id, profile, role ARN)`. Processes
//! coordinate through advisory file locks: shared for the initial read,
//! exclusive for the read-modify-write when a fresh credential is
//! persisted. The cache never blocks credential usage; when it cannot be
//! written the fresh credential is still handed to the caller and only a
//! warning is logged.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub mod error;
pub mod fs;
pub mod types;

use crate::credentials::{Credentials, CredentialsError, CredentialsProvider};
pub use error::FileCacheError;
pub use fs::{Env, FileLock, Filesystem, LockFactory, OsEnv, OsFileLock, OsFilesystem};
pub use types::{CacheKey, CachedCredential};
use types::CacheFile;

/// Environment variable overriding the cache file location.
pub const CACHE_FILE_ENV: &str = "AWS_IAM_AUTHENTICATOR_CACHE_FILE";

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(5);
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// Location of the credential cache file.
///
/// `$AWS_IAM_AUTHENTICATOR_CACHE_FILE` when set, otherwise
/// `$HOME/.kube/cache/aws-iam-authenticator/credentials.yaml` with `HOME`
/// falling back to `USERPROFILE`.
pub fn cache_filename(env: &dyn Env) -> PathBuf {
    if let Some(filename) = env.lookup(CACHE_FILE_ENV) {
        return PathBuf::from(filename);
    }
    let home = match env.get("HOME") {
        home if !home.is_empty() => home,
        _ => env.get("USERPROFILE"),
    };
    PathBuf::from(home)
        .join(".kube")
        .join("cache")
        .join("aws-iam-authenticator")
        .join("credentials.yaml")
}

/// Credentials provider wrapping another provider with the on-disk cache.
pub struct FileCacheProvider {
    credentials: Arc<dyn CredentialsProvider>,
    cache_key: CacheKey,
    cached_credential: RwLock<CachedCredential>,
    filename: PathBuf,
    filesystem: Arc<dyn Filesystem>,
    lock_factory: Arc<LockFactory>,
    lock_timeout: Duration,
}

impl std::fmt::Debug for FileCacheProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCacheProvider")
            .field("cache_key", &self.cache_key)
            .field("filename", &self.filename)
            .field("lock_timeout", &self.lock_timeout)
            .finish_non_exhaustive()
    }
}

impl FileCacheProvider {
    /// Open the cache slot for `(cluster_id, profile, role_arn)` over the
    /// real filesystem, environment and file locks.
    pub fn new(
        cluster_id: &str,
        profile: &str,
        role_arn: &str,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Result<Self, FileCacheError> {
        Self::new_with_dependencies(
            cluster_id,
            profile,
            role_arn,
            credentials,
            Arc::new(OsFilesystem),
            Arc::new(OsEnv),
            Arc::new(|path: &Path| Box::new(OsFileLock::new(path)) as Box<dyn FileLock>),
            DEFAULT_LOCK_TIMEOUT,
        )
    }

    /// Dependency-injecting constructor. Production callers go through
    /// [`new`](Self::new); tests substitute in-memory capabilities.
    #[allow(clippy::too_many_arguments)]
    pub fn new_with_dependencies(
        cluster_id: &str,
        profile: &str,
        role_arn: &str,
        credentials: Arc<dyn CredentialsProvider>,
        filesystem: Arc<dyn Filesystem>,
        env: Arc<dyn Env>,
        lock_factory: Arc<LockFactory>,
        lock_timeout: Duration,
    ) -> Result<Self, FileCacheError> {
        let filename = cache_filename(env.as_ref());
        let cache_key = CacheKey {
            cluster_id: cluster_id.to_string(),
            profile: profile.to_string(),
            role_arn: role_arn.to_string(),
        };

        let mut cached_credential = CachedCredential::default();
        match filesystem.stat(&filename) {
            Ok(info) => {
                // the file holds long-lived secrets, owner-only access
                if info.mode & 0o077 != 0 {
                    return Err(FileCacheError::NotPrivate { filename });
                }

                let lock = lock_factory(&filename);
                match lock.try_read_lock(lock_timeout, LOCK_RETRY_INTERVAL) {
                    Ok(true) => {}
                    Ok(false) => return Err(FileCacheError::LockTimeout { filename }),
                    Err(source) => return Err(FileCacheError::Lock { filename, source }),
                }
                let result = read_while_locked(filesystem.as_ref(), &filename, &cache_key);
                let _ = lock.unlock();
                cached_credential = result?;
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("cache file {} does not exist yet", filename.display());
                if let Some(parent) = filename.parent()
                    && let Err(err) = filesystem.mkdir_all(parent, 0o700)
                {
                    warn!(
                        "could not create cache directory {}: {err}",
                        parent.display()
                    );
                }
                if let Err(err) = filesystem.write(&filename, b"", 0o600) {
                    warn!("could not seed cache file {}: {err}", filename.display());
                }
            }
            Err(source) => return Err(FileCacheError::Stat { source }),
        }

        Ok(Self {
            credentials,
            cache_key,
            cached_credential: RwLock::new(cached_credential),
            filename,
            filesystem,
            lock_factory,
            lock_timeout,
        })
    }

    /// The cached credential as read at open time or updated by the last
    /// retrieve.
    pub async fn cached_credential(&self) -> CachedCredential {
        self.cached_credential.read().await.clone()
    }

    fn persist(&self, credential: &Credentials) -> Result<(), FileCacheError> {
        let lock = (self.lock_factory)(&self.filename);
        match lock.try_lock(self.lock_timeout, LOCK_RETRY_INTERVAL) {
            Ok(true) => {}
            Ok(false) => {
                return Err(FileCacheError::LockTimeout {
                    filename: self.filename.clone(),
                });
            }
            Err(source) => {
                return Err(FileCacheError::Lock {
                    filename: self.filename.clone(),
                    source,
                });
            }
        }
        let result = self.write_while_locked(credential);
        let _ = lock.unlock();
        result
    }

    fn write_while_locked(&self, credential: &Credentials) -> Result<(), FileCacheError> {
        // re-read under the exclusive lock, a concurrent writer may have won
        let mut cache = match self.filesystem.read(&self.filename) {
            Ok(contents) => parse_cache(&contents)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => CacheFile::default(),
            Err(source) => return Err(FileCacheError::Read { source }),
        };

        // keep whichever credential lives longer
        let winner = match cache.get(&self.cache_key).credential {
            Some(existing) if existing.expires > credential.expires => existing,
            _ => credential.clone(),
        };
        cache.put(&self.cache_key, winner);

        let contents = serde_yaml::to_string(&cache)?;
        self.filesystem
            .write(&self.filename, contents.as_bytes(), 0o600)
            .map_err(|source| FileCacheError::Write { source })
    }
}

#[async_trait]
impl CredentialsProvider for FileCacheProvider {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn provide_credentials(&self) -> Result<Credentials, CredentialsError> {
        {
            let cached = self.cached_credential.read().await;
            if !cached.is_expired()
                && let Some(credential) = &cached.credential
            {
                debug!("returning cached credential");
                return Ok(credential.clone());
            }
        }

        let credential = self.credentials.provide_credentials().await?;
        if !credential.can_expire {
            // non-expiring credentials are not worth persisting
            return Ok(credential);
        }

        if let Err(err) = self.persist(&credential) {
            warn!(
                "unable to update credential cache {}: {err}",
                self.filename.display()
            );
        } else {
            debug!("updated credential cache {}", self.filename.display());
        }
        *self.cached_credential.write().await = CachedCredential {
            credential: Some(credential.clone()),
        };
        Ok(credential)
    }
}

fn read_while_locked(
    filesystem: &dyn Filesystem,
    filename: &Path,
    cache_key: &CacheKey,
) -> Result<CachedCredential, FileCacheError> {
    let contents = filesystem
        .read(filename)
        .map_err(|source| FileCacheError::Read { source })?;
    Ok(parse_cache(&contents)?.get(cache_key))
}

fn parse_cache(contents: &[u8]) -> Result<CacheFile, FileCacheError> {
    if contents.iter().all(u8::is_ascii_whitespace) {
        return Ok(CacheFile::default());
    }
    Ok(serde_yaml::from_slice(contents)?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use eyre::Result;

    use super::*;
    use crate::credentials::MockCredentialsProvider;
    use crate::token::filecache::fs::FileInfo;

    #[derive(Default)]
    struct FakeFilesystemState {
        data: Vec<u8>,
        error_kind: Option<io::ErrorKind>,
        mode: u32,
        last_path: Option<PathBuf>,
        written: Option<Vec<u8>>,
        written_mode: Option<u32>,
    }

    struct FakeFilesystem {
        state: Mutex<FakeFilesystemState>,
    }

    impl FakeFilesystem {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                state: Mutex::new(FakeFilesystemState {
                    mode: 0o600,
                    ..Default::default()
                }),
            })
        }

        fn set_data(&self, data: &[u8]) {
            self.state.lock().unwrap().data = data.to_vec();
        }

        fn set_error(&self, kind: Option<io::ErrorKind>) {
            self.state.lock().unwrap().error_kind = kind;
        }

        fn set_mode(&self, mode: u32) {
            self.state.lock().unwrap().mode = mode;
        }

        fn last_path(&self) -> Option<PathBuf> {
            self.state.lock().unwrap().last_path.clone()
        }

        fn written(&self) -> Option<Vec<u8>> {
            self.state.lock().unwrap().written.clone()
        }

        fn written_mode(&self) -> Option<u32> {
            self.state.lock().unwrap().written_mode
        }

        fn fail(state: &FakeFilesystemState) -> io::Result<()> {
            match state.error_kind {
                Some(kind) => Err(io::Error::from(kind)),
                None => Ok(()),
            }
        }
    }

    impl Filesystem for FakeFilesystem {
        fn stat(&self, path: &Path) -> io::Result<FileInfo> {
            let mut state = self.state.lock().unwrap();
            state.last_path = Some(path.to_path_buf());
            Self::fail(&state)?;
            Ok(FileInfo { mode: state.mode })
        }

        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            let mut state = self.state.lock().unwrap();
            state.last_path = Some(path.to_path_buf());
            Self::fail(&state)?;
            Ok(state.data.clone())
        }

        fn write(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
            let mut state = self.state.lock().unwrap();
            state.last_path = Some(path.to_path_buf());
            Self::fail(&state)?;
            state.data = data.to_vec();
            state.written = Some(data.to_vec());
            state.written_mode = Some(mode);
            Ok(())
        }

        fn mkdir_all(&self, path: &Path, _mode: u32) -> io::Result<()> {
            let mut state = self.state.lock().unwrap();
            state.last_path = Some(path.to_path_buf());
            Self::fail(&state)
        }
    }

    struct FakeEnv {
        values: HashMap<String, String>,
    }

    impl FakeEnv {
        fn with_home() -> Arc<Self> {
            Arc::new(Self {
                values: HashMap::from([
                    ("HOME".to_string(), "homedir".to_string()),
                    ("USERPROFILE".to_string(), "homedir".to_string()),
                ]),
            })
        }
    }

    impl Env for FakeEnv {
        fn get(&self, key: &str) -> String {
            self.values.get(key).cloned().unwrap_or_default()
        }

        fn lookup(&self, key: &str) -> Option<String> {
            self.values.get(key).cloned()
        }
    }

    #[derive(Default)]
    struct FakeLockState {
        contended: AtomicBool,
        erroring: AtomicBool,
    }

    struct FakeLock {
        state: Arc<FakeLockState>,
    }

    impl FakeLock {
        fn attempt(&self) -> io::Result<bool> {
            if self.state.erroring.load(Ordering::SeqCst) {
                return Err(io::Error::other("lock stuck, needs wd-40"));
            }
            Ok(!self.state.contended.load(Ordering::SeqCst))
        }
    }

    impl FileLock for FakeLock {
        fn try_lock(&self, _timeout: Duration, _retry_interval: Duration) -> io::Result<bool> {
            self.attempt()
        }

        fn try_read_lock(
            &self,
            _timeout: Duration,
            _retry_interval: Duration,
        ) -> io::Result<bool> {
            self.attempt()
        }

        fn unlock(&self) -> io::Result<()> {
            Ok(())
        }
    }

    fn lock_factory(state: Arc<FakeLockState>) -> Arc<LockFactory> {
        Arc::new(move |_path: &Path| {
            Box::new(FakeLock {
                state: state.clone(),
            }) as Box<dyn FileLock>
        })
    }

    fn stub_credential(expires: Option<DateTime<Utc>>) -> Credentials {
        Credentials {
            access_key_id: "AKID".into(),
            secret_access_key: "SECRET".into(),
            session_token: "TOKEN".into(),
            source: "stubProvider".into(),
            can_expire: expires.is_some(),
            expires,
        }
    }

    fn cached_yaml(expires: DateTime<Utc>) -> String {
        format!(
            "clusters:\n  CLUSTER:\n    PROFILE:\n      ARN:\n        credential:\n          accesskeyid: ABC\n          secretaccesskey: DEF\n          sessiontoken: GHI\n          source: JKL\n          canexpire: true\n          expires: {}\n",
            expires.to_rfc3339()
        )
    }

    fn open(
        filesystem: Arc<FakeFilesystem>,
        lock_state: Arc<FakeLockState>,
        upstream: MockCredentialsProvider,
    ) -> Result<FileCacheProvider, FileCacheError> {
        FileCacheProvider::new_with_dependencies(
            "CLUSTER",
            "PROFILE",
            "ARN",
            Arc::new(upstream),
            filesystem,
            FakeEnv::with_home(),
            lock_factory(lock_state),
            Duration::from_millis(50),
        )
    }

    #[test]
    fn test_cache_filename() {
        assert_eq!(
            PathBuf::from("homedir")
                .join(".kube")
                .join("cache")
                .join("aws-iam-authenticator")
                .join("credentials.yaml"),
            cache_filename(FakeEnv::with_home().as_ref())
        );

        let mut env = FakeEnv {
            values: HashMap::from([("HOME".to_string(), "homedir".to_string())]),
        };
        env.values
            .insert(CACHE_FILE_ENV.to_string(), "special.yaml".to_string());
        assert_eq!(PathBuf::from("special.yaml"), cache_filename(&env));
    }

    #[test]
    fn test_open_missing_cache_file() {
        let filesystem = FakeFilesystem::new();
        filesystem.set_error(Some(io::ErrorKind::NotFound));
        let provider = open(
            filesystem,
            Arc::new(FakeLockState::default()),
            MockCredentialsProvider::default(),
        )
        .expect("a missing cache file is not an error");

        assert!(
            provider.cached_credential.blocking_read().is_expired(),
            "missing cache file must yield an expired cached credential"
        );
    }

    #[test]
    fn test_open_bad_permissions() {
        let filesystem = FakeFilesystem::new();
        filesystem.set_mode(0o777);
        match open(
            filesystem.clone(),
            Arc::new(FakeLockState::default()),
            MockCredentialsProvider::default(),
        ) {
            Err(FileCacheError::NotPrivate { filename }) => {
                assert_eq!(cache_filename(FakeEnv::with_home().as_ref()), filename);
            }
            other => panic!("expected a permissions error, got {other:?}"),
        }
        assert_eq!(
            Some(cache_filename(FakeEnv::with_home().as_ref())),
            filesystem.last_path()
        );
    }

    #[test]
    fn test_open_unlockable() {
        let lock_state = Arc::new(FakeLockState::default());
        lock_state.erroring.store(true, Ordering::SeqCst);
        match open(
            FakeFilesystem::new(),
            lock_state,
            MockCredentialsProvider::default(),
        ) {
            Err(FileCacheError::Lock { .. }) => {}
            other => panic!("expected a lock error, got {other:?}"),
        }

        let lock_state = Arc::new(FakeLockState::default());
        lock_state.contended.store(true, Ordering::SeqCst);
        match open(
            FakeFilesystem::new(),
            lock_state,
            MockCredentialsProvider::default(),
        ) {
            Err(FileCacheError::LockTimeout { .. }) => {}
            other => panic!("expected a lock timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_open_unstattable() {
        let filesystem = FakeFilesystem::new();
        filesystem.set_error(Some(io::ErrorKind::PermissionDenied));
        match open(
            filesystem,
            Arc::new(FakeLockState::default()),
            MockCredentialsProvider::default(),
        ) {
            Err(FileCacheError::Stat { .. }) => {}
            other => panic!("expected a stat error, got {other:?}"),
        }
    }

    #[test]
    fn test_open_unparseable() {
        let filesystem = FakeFilesystem::new();
        filesystem.set_data(b"invalid: yaml: file");
        match open(
            filesystem,
            Arc::new(FakeLockState::default()),
            MockCredentialsProvider::default(),
        ) {
            Err(FileCacheError::Parse { .. }) => {}
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_open_empty_cache_file() {
        let provider = open(
            FakeFilesystem::new(),
            Arc::new(FakeLockState::default()),
            MockCredentialsProvider::default(),
        )
        .expect("an empty cache file is not an error");
        assert!(provider.cached_credential.blocking_read().is_expired());
    }

    #[test]
    fn test_open_cluster_without_matching_arn() {
        let filesystem = FakeFilesystem::new();
        filesystem.set_data(b"clusters:\n  CLUSTER:\n");
        let provider = open(
            filesystem,
            Arc::new(FakeLockState::default()),
            MockCredentialsProvider::default(),
        )
        .unwrap();
        assert!(provider.cached_credential.blocking_read().is_expired());
    }

    #[test]
    fn test_open_with_matching_arn() {
        let expires = Utc::now() + TimeDelta::hours(1);
        let filesystem = FakeFilesystem::new();
        filesystem.set_data(cached_yaml(expires).as_bytes());
        let provider = open(
            filesystem,
            Arc::new(FakeLockState::default()),
            MockCredentialsProvider::default(),
        )
        .unwrap();

        let cached = provider.cached_credential.blocking_read().clone();
        assert!(!cached.is_expired());
        let credential = cached.credential.expect("credential extracted");
        assert_eq!("ABC", credential.access_key_id);
        assert_eq!("DEF", credential.secret_access_key);
        assert_eq!("GHI", credential.session_token);
        assert_eq!("JKL", credential.source);
        assert_eq!(Some(expires), credential.expires);
    }

    #[tokio::test]
    async fn test_retrieve_without_expiry_is_not_persisted() -> Result<()> {
        let mut upstream = MockCredentialsProvider::default();
        upstream
            .expect_provide_credentials()
            .returning(|| Ok(stub_credential(None)));

        let filesystem = FakeFilesystem::new();
        let provider = open(
            filesystem.clone(),
            Arc::new(FakeLockState::default()),
            upstream,
        )?;

        let credential = provider.provide_credentials().await?;
        assert_eq!(stub_credential(None), credential);
        assert_eq!(None, filesystem.written(), "nothing must be persisted");
        Ok(())
    }

    #[tokio::test]
    async fn test_retrieve_with_expiry_unlockable() -> Result<()> {
        let expires = Utc.with_ymd_and_hms(2120, 9, 19, 13, 14, 0).unwrap();
        let mut upstream = MockCredentialsProvider::default();
        upstream
            .expect_provide_credentials()
            .returning(move || Ok(stub_credential(Some(expires))));

        let filesystem = FakeFilesystem::new();
        let lock_state = Arc::new(FakeLockState::default());
        let provider = open(filesystem.clone(), lock_state.clone(), upstream)?;

        // the write lock cannot be taken, the credential flows through anyway
        lock_state.erroring.store(true, Ordering::SeqCst);
        let credential = provider.provide_credentials().await?;
        assert_eq!(stub_credential(Some(expires)), credential);
        assert_eq!(None, filesystem.written());
        Ok(())
    }

    #[tokio::test]
    async fn test_retrieve_with_expiry_unwritable() -> Result<()> {
        let expires = Utc.with_ymd_and_hms(2120, 9, 19, 13, 14, 0).unwrap();
        let mut upstream = MockCredentialsProvider::default();
        upstream
            .expect_provide_credentials()
            .returning(move || Ok(stub_credential(Some(expires))));

        let filesystem = FakeFilesystem::new();
        let provider = open(
            filesystem.clone(),
            Arc::new(FakeLockState::default()),
            upstream,
        )?;

        filesystem.set_error(Some(io::ErrorKind::PermissionDenied));
        let credential = provider.provide_credentials().await?;
        assert_eq!(stub_credential(Some(expires)), credential);
        Ok(())
    }

    #[tokio::test]
    async fn test_retrieve_with_expiry_persists() -> Result<()> {
        let expires = Utc
            .with_ymd_and_hms(2120, 9, 19, 13, 14, 0)
            .unwrap()
            + TimeDelta::nanoseconds(1_000_000);
        let mut upstream = MockCredentialsProvider::default();
        upstream
            .expect_provide_credentials()
            .times(1)
            .returning(move || Ok(stub_credential(Some(expires))));

        let filesystem = FakeFilesystem::new();
        let provider = open(
            filesystem.clone(),
            Arc::new(FakeLockState::default()),
            upstream,
        )?;

        let credential = provider.provide_credentials().await?;
        assert_eq!(stub_credential(Some(expires)), credential);

        assert_eq!(Some(0o600), filesystem.written_mode());
        let written = filesystem.written().expect("cache file written");
        let written = String::from_utf8(written)?;
        for needle in [
            "clusters:",
            "CLUSTER:",
            "PROFILE:",
            "ARN:",
            "accesskeyid: AKID",
            "secretaccesskey: SECRET",
            "sessiontoken: TOKEN",
            "source: stubProvider",
            "canexpire: true",
        ] {
            assert!(written.contains(needle), "{needle:?} not in {written}");
        }

        // the in-memory copy is fresh, so the next retrieve is free of I/O
        // and of upstream calls (the mock would panic on a second call)
        let again = provider.provide_credentials().await?;
        assert_eq!(credential, again);
        Ok(())
    }

    #[tokio::test]
    async fn test_retrieve_cache_hit_skips_upstream() -> Result<()> {
        let expires = Utc::now() + TimeDelta::hours(1);
        let filesystem = FakeFilesystem::new();
        filesystem.set_data(cached_yaml(expires).as_bytes());

        // no expectations: any upstream call panics the mock
        let provider = open(
            filesystem,
            Arc::new(FakeLockState::default()),
            MockCredentialsProvider::default(),
        )?;

        let credential = provider.provide_credentials().await?;
        assert_eq!("ABC", credential.access_key_id);
        assert_eq!("DEF", credential.secret_access_key);
        assert_eq!("GHI", credential.session_token);
        assert_eq!("JKL", credential.source);
        Ok(())
    }

    #[tokio::test]
    async fn test_retrieve_keeps_later_expiry_of_concurrent_writer() -> Result<()> {
        let fresh_expires = Utc.with_ymd_and_hms(2120, 9, 19, 13, 14, 0).unwrap();
        let racing_expires = fresh_expires + TimeDelta::hours(1);

        let mut upstream = MockCredentialsProvider::default();
        upstream
            .expect_provide_credentials()
            .returning(move || Ok(stub_credential(Some(fresh_expires))));

        let filesystem = FakeFilesystem::new();
        let provider = open(
            filesystem.clone(),
            Arc::new(FakeLockState::default()),
            upstream,
        )?;

        // another process wrote a longer-lived credential in the meantime
        filesystem.set_data(cached_yaml(racing_expires).as_bytes());

        provider.provide_credentials().await?;

        let written: CacheFile = serde_yaml::from_slice(&filesystem.written().unwrap())?;
        let persisted = written
            .get(&CacheKey {
                cluster_id: "CLUSTER".into(),
                profile: "PROFILE".into(),
                role_arn: "ARN".into(),
            })
            .credential
            .expect("entry persisted");
        assert_eq!(
            Some(racing_expires),
            persisted.expires,
            "the later expiry must win the upsert"
        );
        Ok(())
    }
}
