// Persistent bearer token stores.
//
// Both map their failures to `erpdesk_api::Error::Credentials`, which the
// client treats as "no token" on load.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use erpdesk_api::{Error, TokenStore};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

// ── File ────────────────────────────────────────────────────────────

/// One token per file, readable only by the owner on unix.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/tokens/<profile>.token`
    pub fn for_profile(profile: &str) -> Self {
        Self::new(crate::data_dir().join("tokens").join(format!("{profile}.token")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        file.write_all(contents.as_bytes())
    }
}

fn credentials(action: &str, path: &Path, err: &io::Error) -> Error {
    Error::Credentials(format!("cannot {action} {}: {err}", path.display()))
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<SecretString>, Error> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| SecretString::from(token)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(credentials("read", &self.path, &e)),
        }
    }

    fn save(&self, token: &SecretString) -> Result<(), Error> {
        debug!(path = %self.path.display(), "saving token");
        self.write(token.expose_secret())
            .map_err(|e| credentials("write", &self.path, &e))
    }

    fn clear(&self) -> Result<(), Error> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(credentials("remove", &self.path, &e)),
        }
    }
}

// ── Keyring ─────────────────────────────────────────────────────────

/// Token kept in the system keyring under `<profile>/token`.
pub struct KeyringTokenStore {
    service: String,
    account: String,
}

impl KeyringTokenStore {
    pub fn new(service: &str, profile: &str) -> Self {
        Self {
            service: service.into(),
            account: format!("{profile}/token"),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, Error> {
        keyring::Entry::new(&self.service, &self.account)
            .map_err(|e| Error::Credentials(format!("keyring unavailable: {e}")))
    }
}

impl fmt::Debug for KeyringTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyringTokenStore")
            .field("service", &self.service)
            .field("account", &self.account)
            .finish()
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<SecretString>, Error> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(SecretString::from(token))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::Credentials(format!("keyring read failed: {e}"))),
        }
    }

    fn save(&self, token: &SecretString) -> Result<(), Error> {
        self.entry()?
            .set_password(token.expose_secret())
            .map_err(|e| Error::Credentials(format!("keyring write failed: {e}")))
    }

    fn clear(&self) -> Result<(), Error> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::Credentials(format!("keyring delete failed: {e}"))),
        }
    }
}
