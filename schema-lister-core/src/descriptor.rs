//! Connection descriptor construction.
//!
//! The descriptor is a plain `key=value;...` string. Values are inserted
//! verbatim: a `;` or `=` inside the server, user or password is not
//! escaped and will change how the driver splits the string.

use crate::config::Configuration;
use zeroize::Zeroizing;

/// Formatted string telling the driver where to connect and how to log in.
///
/// `Display` yields the raw descriptor, password included. `Debug` and
/// [`ConnectionDescriptor::redacted`] mask the password.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    raw: Zeroizing<String>,
    redacted: String,
}

impl ConnectionDescriptor {
    /// Builds `server=<server>;user id=<user>;password=<password>;port=<port>`
    pub fn from_config(config: &Configuration) -> Self {
        Self {
            raw: Zeroizing::new(format!(
                "server={};user id={};password={};port={}",
                config.server(),
                config.user(),
                config.password(),
                config.port()
            )),
            redacted: format!(
                "server={};user id={};password=****;port={}",
                config.server(),
                config.user(),
                config.port()
            ),
        }
    }

    /// Raw descriptor text
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Descriptor with the password replaced by `****`, for logs.
    ///
    /// Built from the configuration fields, so a password containing `;` or
    /// `=` is masked as a whole.
    ///
    /// # Example
    /// ```rust
    /// use schema_lister_core::{Configuration, ConnectionDescriptor};
    ///
    /// let config = Configuration::default().with_password("secret");
    /// let descriptor = ConnectionDescriptor::from_config(&config);
    /// assert_eq!(
    ///     descriptor.redacted(),
    ///     "server=localhost;user id=sa;password=****;port=1433"
    /// );
    /// ```
    pub fn redacted(&self) -> &str {
        &self.redacted
    }
}

impl From<&Configuration> for ConnectionDescriptor {
    fn from(config: &Configuration) -> Self {
        Self::from_config(config)
    }
}

impl std::fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ConnectionDescriptor")
            .field(&self.redacted)
            .finish()
    }
}
