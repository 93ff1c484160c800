//! Run configuration.
//!
//! A [`Configuration`] is built once at startup and only read afterwards.
//! No value is validated here: any server, user or password string and any
//! port integer is accepted, and bad values surface when the driver tries
//! to connect.

use zeroize::Zeroizing;

/// Server used when none is given
pub const DEFAULT_SERVER: &str = "localhost";
/// SQL Server's well-known TCP port
pub const DEFAULT_PORT: i64 = 1433;
/// Login used when none is given
pub const DEFAULT_USER: &str = "sa";
/// Placeholder password matching the stock development container
pub const DEFAULT_PASSWORD: &str = "my-secret-pw-12345";

/// Immutable snapshot of the run settings.
///
/// # Security
/// The password lives in a `Zeroizing` buffer and is masked in `Debug`
/// output. It is only ever printed verbatim by the debug block of the
/// listing report, and only when `debug` is enabled.
///
/// # Example
/// ```rust
/// use schema_lister_core::Configuration;
///
/// let config = Configuration::default()
///     .with_server("db1")
///     .with_port(5555)
///     .with_user("alice")
///     .with_password("secret");
///
/// assert_eq!(config.server(), "db1");
/// assert_eq!(config.port(), 5555);
/// assert!(!config.debug());
/// assert!(!format!("{config:?}").contains("secret"));
/// ```
#[derive(Clone)]
pub struct Configuration {
    server: String,
    port: i64,
    user: String,
    password: Zeroizing<String>,
    debug: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: Zeroizing::new(DEFAULT_PASSWORD.to_string()),
            debug: false,
        }
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"****")
            .field("debug", &self.debug)
            .finish()
    }
}

impl Configuration {
    /// Sets the server host
    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Sets the TCP port
    #[must_use]
    pub const fn with_port(mut self, port: i64) -> Self {
        self.port = port;
        self
    }

    /// Sets the login name
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Sets the password
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Zeroizing::new(password.into());
        self
    }

    /// Enables or disables the debug block
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Server host
    pub fn server(&self) -> &str {
        &self.server
    }

    /// TCP port
    pub const fn port(&self) -> i64 {
        self.port
    }

    /// Login name
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Raw password. Callers must not log this.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Whether the debug block is printed
    pub const fn debug(&self) -> bool {
        self.debug
    }
}
