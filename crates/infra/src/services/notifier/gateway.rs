use reqwest::Client;
use serde::Serialize;
use tracing::info;

/// HTTP transport shared by all senders. Without a gateway url the payload
/// is only logged.
pub struct GatewayClient {
    client: Client,
    url: Option<String>,
    key: Option<String>,
}

impl GatewayClient {
    pub fn new(url: Option<String>, key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url,
            key,
        }
    }

    pub async fn post<T: Serialize + std::fmt::Debug>(
        &self,
        path: &str,
        payload: &T,
    ) -> anyhow::Result<()> {
        let url = match &self.url {
            Some(url) => format!("{}/{}", url.trim_end_matches('/'), path),
            None => {
                info!("Dry run, not delivering {}: {:?}", path, payload);
                return Ok(());
            }
        };

        let mut req = self.client.post(&url).json(payload);
        if let Some(key) = &self.key {
            req = req.header("subtrack-gateway-key", key.clone());
        }
        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "Notification gateway {} responded with status {}",
                url,
                status
            ));
        }
        Ok(())
    }
}
