//! SQL Server driver over TDS, backed by `tiberius`.
//!
//! The descriptor is parsed here, not by the pipeline. It is a
//! `;`-separated list of `key=value` pairs with no quoting: a `;` inside a
//! value splits it. Keys are matched case-insensitively:
//!
//! - `server`, `data source`, `address`: host, optionally `host\instance`
//! - `port`: TCP port
//! - `user id`, `uid`, `user`: SQL login
//! - `password`, `pwd`: SQL password
//! - `database`, `initial catalog`: initial database
//! - `encrypt`: `disable`, `false` (login only, the default) or `true`
//! - `trustservercertificate`: skip certificate validation
//!
//! Segments without `=` and unknown keys are ignored.

use super::{Connection, Cursor, Driver, Statement};
use crate::error::{DriverError, DriverResult};
use futures::TryStreamExt;
use futures::stream::BoxStream;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, Query, Row, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, trace};
use zeroize::Zeroizing;

type TdsClient = Client<Compat<TcpStream>>;

/// How much of the session is encrypted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptMode {
    /// No TLS at all
    Disable,
    /// Only the login packet is encrypted
    #[default]
    LoginOnly,
    /// The whole session is encrypted
    Required,
}

/// Settings recovered from a descriptor.
///
/// `Debug` masks the password.
#[derive(Clone, PartialEq, Eq)]
pub struct TdsParams {
    host: String,
    instance: Option<String>,
    port: Option<u16>,
    user: String,
    password: Zeroizing<String>,
    database: Option<String>,
    encrypt: EncryptMode,
    trust_server_certificate: Option<bool>,
}

impl Default for TdsParams {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            instance: None,
            port: None,
            user: String::new(),
            password: Zeroizing::new(String::new()),
            database: None,
            encrypt: EncryptMode::default(),
            trust_server_certificate: None,
        }
    }
}

impl std::fmt::Debug for TdsParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TdsParams")
            .field("host", &self.host)
            .field("instance", &self.instance)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"****")
            .field("database", &self.database)
            .field("encrypt", &self.encrypt)
            .field("trust_server_certificate", &self.trust_server_certificate)
            .finish()
    }
}

impl TdsParams {
    /// Parses a descriptor.
    ///
    /// # Errors
    /// Returns an error if `port`, `encrypt` or `trustservercertificate`
    /// has a value that cannot be parsed
    ///
    /// # Example
    /// ```rust
    /// use schema_lister_core::driver::tds::TdsParams;
    ///
    /// let params = TdsParams::parse("server=db1;user id=alice;password=secret;port=5555")?;
    /// assert_eq!(params.host(), "db1");
    /// assert_eq!(params.port(), Some(5555));
    /// assert_eq!(params.user(), "alice");
    /// # Ok::<(), schema_lister_core::DriverError>(())
    /// ```
    pub fn parse(descriptor: &str) -> DriverResult<Self> {
        let mut params = Self::default();

        for segment in descriptor.split(';') {
            let Some((key, value)) = segment.split_once('=') else {
                if !segment.trim().is_empty() {
                    trace!("Ignoring descriptor segment without '='");
                }
                continue;
            };
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "server" | "data source" | "address" => params.set_server(value),
                "port" => {
                    let port = value.parse::<u16>().map_err(|e| {
                        DriverError::new(format!("invalid port '{value}': {e}"))
                    })?;
                    params.port = Some(port);
                }
                "user id" | "uid" | "user" => params.user = value.to_string(),
                "password" | "pwd" => params.password = Zeroizing::new(value.to_string()),
                "database" | "initial catalog" => {
                    params.database = (!value.is_empty()).then(|| value.to_string());
                }
                "encrypt" => params.encrypt = parse_encrypt(value)?,
                "trustservercertificate" => {
                    params.trust_server_certificate =
                        Some(parse_bool("trustservercertificate", value)?);
                }
                other => debug!("Ignoring unknown descriptor key '{}'", other),
            }
        }

        Ok(params)
    }

    fn set_server(&mut self, value: &str) {
        match value.split_once('\\') {
            Some((host, instance)) => {
                self.host = host.to_string();
                self.instance = (!instance.is_empty()).then(|| instance.to_string());
            }
            None => {
                self.host = value.to_string();
                self.instance = None;
            }
        }
        if self.host.is_empty() || self.host == "." || self.host.eq_ignore_ascii_case("(local)") {
            self.host = "localhost".to_string();
        }
    }

    /// Host name or address
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Named instance, if any
    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    /// Explicit port, if any
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// SQL login
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Initial database, if any
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Encryption mode
    pub const fn encrypt(&self) -> EncryptMode {
        self.encrypt
    }

    /// Whether the server certificate is accepted without validation.
    ///
    /// Defaults to trusting when only the login packet is encrypted.
    pub fn trusts_server_certificate(&self) -> bool {
        self.trust_server_certificate
            .unwrap_or(self.encrypt == EncryptMode::LoginOnly)
    }

    /// Whether the port must be looked up through the SQL Browser service
    pub const fn uses_browser(&self) -> bool {
        self.instance.is_some() && self.port.is_none()
    }

    /// Builds the `tiberius` client configuration
    pub fn to_config(&self) -> Config {
        let mut config = Config::new();
        config.host(&self.host);
        if let Some(port) = self.port {
            config.port(port);
        }
        if let Some(instance) = &self.instance {
            config.instance_name(instance);
        }
        if let Some(database) = &self.database {
            config.database(database);
        }
        config.authentication(AuthMethod::sql_server(&self.user, self.password.as_str()));
        config.encryption(match self.encrypt {
            EncryptMode::Disable => EncryptionLevel::NotSupported,
            EncryptMode::LoginOnly => EncryptionLevel::Off,
            EncryptMode::Required => EncryptionLevel::Required,
        });
        if self.trusts_server_certificate() {
            config.trust_cert();
        }
        config
    }
}

fn parse_encrypt(value: &str) -> DriverResult<EncryptMode> {
    if value.eq_ignore_ascii_case("disable") {
        return Ok(EncryptMode::Disable);
    }
    if parse_bool("encrypt", value)? {
        Ok(EncryptMode::Required)
    } else {
        Ok(EncryptMode::LoginOnly)
    }
}

fn parse_bool(key: &str, value: &str) -> DriverResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(DriverError::new(format!(
            "invalid value '{value}' for '{key}'"
        ))),
    }
}

/// SQL Server driver
#[derive(Debug, Clone, Copy, Default)]
pub struct TdsDriver;

impl TdsDriver {
    /// Creates the driver
    pub const fn new() -> Self {
        Self
    }
}

impl Driver for TdsDriver {
    type Connection = TdsConnection;

    fn name(&self) -> &'static str {
        "mssql"
    }

    async fn open(&self, descriptor: &str) -> DriverResult<TdsConnection> {
        let params = TdsParams::parse(descriptor)?;
        debug!("Resolved connection parameters: {:?}", params);
        let config = params.to_config();

        let tcp = if params.uses_browser() {
            TcpStream::connect_named(&config).await?
        } else {
            TcpStream::connect(config.get_addr()).await?
        };
        tcp.set_nodelay(true)?;

        let client = Client::connect(config, tcp.compat_write()).await?;
        debug!("TDS session established");

        Ok(TdsConnection { client })
    }
}

/// Live TDS session
pub struct TdsConnection {
    client: TdsClient,
}

impl std::fmt::Debug for TdsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TdsConnection").finish_non_exhaustive()
    }
}

impl Connection for TdsConnection {
    type Statement<'c>
        = TdsStatement<'c>
    where
        Self: 'c;

    async fn prepare(&mut self, text: &str) -> DriverResult<TdsStatement<'_>> {
        // Statements without parameters go out as a plain batch, so there is
        // nothing to send to the server until execution.
        if text.trim().is_empty() {
            return Err(DriverError::new("statement text is empty"));
        }

        Ok(TdsStatement {
            client: &mut self.client,
            text: text.to_string(),
        })
    }

    async fn close(self) -> DriverResult<()> {
        self.client.close().await?;
        Ok(())
    }
}

/// Statement bound to a [`TdsConnection`]
pub struct TdsStatement<'c> {
    client: &'c mut TdsClient,
    text: String,
}

impl std::fmt::Debug for TdsStatement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TdsStatement")
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

impl Statement for TdsStatement<'_> {
    type Cursor<'s>
        = TdsCursor<'s>
    where
        Self: 's;

    async fn execute(&mut self) -> DriverResult<TdsCursor<'_>> {
        let stream = Query::new(self.text.clone())
            .query(&mut *self.client)
            .await?;

        Ok(TdsCursor {
            rows: stream.into_row_stream(),
            current: None,
        })
    }
}

/// Forward-only cursor over a TDS result stream
pub struct TdsCursor<'s> {
    rows: BoxStream<'s, tiberius::Result<Row>>,
    current: Option<Row>,
}

impl std::fmt::Debug for TdsCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TdsCursor")
            .field("positioned", &self.current.is_some())
            .finish_non_exhaustive()
    }
}

impl Cursor for TdsCursor<'_> {
    async fn advance(&mut self) -> DriverResult<bool> {
        self.current = self.rows.try_next().await?;
        Ok(self.current.is_some())
    }

    fn scan_text(&self) -> DriverResult<String> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| DriverError::new("no current row"))?;

        match row.try_get::<&str, usize>(0)? {
            Some(value) => Ok(value.to_string()),
            None => Err(DriverError::new("converting NULL to string is unsupported")),
        }
    }

    async fn close(mut self) -> DriverResult<()> {
        // The session cannot be reused until the pending result is consumed.
        let mut discarded: u64 = 0;
        while self.rows.try_next().await?.is_some() {
            discarded = discarded.saturating_add(1);
        }
        if discarded > 0 {
            trace!("Discarded {} unread rows", discarded);
        }
        Ok(())
    }
}
