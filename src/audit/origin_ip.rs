use serde::Deserialize;
use tokio::sync::OnceCell;

pub const UNKNOWN_IP: &str = "Não identificado";

#[derive(Deserialize)]
struct LookupResponse {
    ip: String,
}

/// The service's public address as reported by an IP echo endpoint.
///
/// Looked up at most once successfully per process; failed lookups are not cached,
/// so a later call tries again. Until then callers get [`UNKNOWN_IP`].
pub struct OriginIp {
    cell: OnceCell<String>,
    client: reqwest::Client,
    lookup_url: Option<String>,
}

impl OriginIp {
    pub fn new(client: reqwest::Client, lookup_url: Option<String>) -> Self {
        OriginIp {
            cell: OnceCell::new(),
            client,
            lookup_url,
        }
    }

    /// Already-known address, no lookup.
    pub fn fixed(ip: impl Into<String>) -> Self {
        OriginIp {
            cell: OnceCell::new_with(Some(ip.into())),
            client: reqwest::Client::new(),
            lookup_url: None,
        }
    }

    pub fn cached(&self) -> Option<&str> {
        self.cell.get().map(String::as_str)
    }

    pub async fn resolve(&self) -> String {
        if let Some(ip) = self.cell.get() {
            return ip.clone();
        }
        let Some(url) = self.lookup_url.as_deref() else {
            return UNKNOWN_IP.to_string();
        };

        let result = self
            .cell
            .get_or_try_init(|| async {
                let response = self.client.get(url).send().await?.error_for_status()?;
                let body: LookupResponse = response.json().await?;
                Ok::<_, reqwest::Error>(body.ip)
            })
            .await;

        match result {
            Ok(ip) => ip.clone(),
            Err(e) => {
                log::warn!("Origin IP lookup failed: {e}");
                UNKNOWN_IP.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn without_lookup_url_falls_back() {
        let origin = OriginIp::new(reqwest::Client::new(), None);
        assert_eq!(origin.resolve().await, UNKNOWN_IP);
        assert_eq!(origin.cached(), None);
    }

    #[tokio::test]
    async fn fixed_value_is_returned() {
        let origin = OriginIp::fixed("187.0.0.1");
        assert_eq!(origin.resolve().await, "187.0.0.1");
    }
}
