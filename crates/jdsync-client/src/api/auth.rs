//! Auth API.

use jdsync_config::SyncConfig;
use tracing::{info, warn};

use crate::client::PanelClient;
use crate::error::{Error, Result};
use crate::types::{TokenData, TokenQuery};

/// Auth API client.
///
/// The token endpoint is the only one called without a bearer token.
pub struct AuthApi {
    client: PanelClient,
}

impl AuthApi {
    pub(crate) fn new(client: PanelClient) -> Self {
        Self { client }
    }

    /// Exchange the configured client id and secret for a bearer token.
    pub async fn token(&self, config: &SyncConfig) -> Result<String> {
        let url = self.client.url(config, "open/auth/token")?;
        let query = TokenQuery {
            client_id: &config.client_id,
            client_secret: &config.client_secret,
        };

        let body = self
            .client
            .get::<TokenData, _>(url, None, &query)
            .await
            .map_err(|e| e.into_operation(Error::AuthFailed))?;

        let token = body
            .data
            .as_ref()
            .and_then(|d| d.token.as_deref())
            .filter(|t| !t.is_empty());

        match token {
            Some(token) if body.is_ok() => {
                info!("Panel token obtained");
                Ok(token.to_string())
            }
            _ => {
                let message = body.message_or("Failed to get token");
                warn!(code = body.code, message = %message, "Panel token request rejected");
                Err(Error::AuthFailed(message))
            }
        }
    }
}
