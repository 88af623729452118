//! Dial parameters.

use std::fmt;

/// Parameters of one dial.
///
/// `Debug` output never includes the password.
///
/// ## Example
///
/// ```rust
/// use dbtel::client::DialParams;
///
/// let params = DialParams::builder()
///     .address("db.internal:3306")
///     .user("app")
///     .password("hunter2")
///     .database("shop")
///     .build();
///
/// assert_eq!(params.network(), "tcp");
/// assert!(!format!("{params:?}").contains("hunter2"));
/// ```
#[derive(Clone, bon::Builder)]
pub struct DialParams {
    /// Transport network, `tcp` or `unix`.
    #[builder(into, default = "tcp".to_string())]
    network: String,

    /// Server address, `host:port` or a socket path.
    #[builder(into)]
    address: String,

    /// Login user.
    #[builder(into, default)]
    user: String,

    /// Login password.
    #[builder(into, default)]
    password: String,

    /// Database selected after login.
    #[builder(into, default)]
    database: String,
}

impl DialParams {
    /// Returns the transport network.
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Returns the server address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the login user.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Returns the login password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns the database selected after login.
    pub fn database(&self) -> &str {
        &self.database
    }
}

impl fmt::Debug for DialParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialParams")
            .field("network", &self.network)
            .field("address", &self.address)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .finish()
    }
}
