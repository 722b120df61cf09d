use std::fmt;

use eyre::Result;
use serde::Deserialize;

/// Service configuration structure
///
/// This structure contains all the configuration parameters for the gateway
/// and the chain client it wraps.
#[derive(Deserialize, Clone)]
pub struct Config {
    /// Host address to bind the server to (default: 127.0.0.1)
    pub host: String,

    /// Port to listen on (default: 8080)
    pub port: u16,

    /// Ethereum RPC endpoint URL for communicating with the blockchain
    pub ethereum_rpc_url: String,

    /// Name attached to the client's diagnostics (default: alloy)
    pub client_name: String,

    /// Hex private key used for local signing (optional)
    #[serde(default)]
    pub signer_private_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This method reads a `.env` file if present, then the process
    /// environment, using default values when variables are not defined.
    ///
    /// # Environment Variables
    ///
    /// * `HOST` - Server host address (default: "127.0.0.1")
    /// * `PORT` - Server port (default: 8080)
    /// * `ETHEREUM_RPC_URL` - Ethereum RPC URL (default: "http://localhost:8545")
    /// * `CLIENT_NAME` - Client name used in logs (default: "alloy")
    /// * `SIGNER_PRIVATE_KEY` - Private key for local signing (default: none)
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (useful for development)
        let _ = dotenv::dotenv();

        let settings = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("ethereum_rpc_url", "http://localhost:8545")?
            .set_default("client_name", "alloy")?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ethereum_rpc_url", &self.ethereum_rpc_url)
            .field("client_name", &self.client_name)
            .field(
                "signer_private_key",
                &self.signer_private_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
