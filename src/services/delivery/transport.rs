use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

use crate::config::DeliveryConfig;
use crate::error::TransportError;
use crate::kernel::packet::TelemetryPacket;

pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'a>>;

/// One packet per request to the ingest boundary. Any 2xx is success.
pub trait NetworkTransport: Send + Sync {
    fn send<'a>(&'a self, packet: &'a TelemetryPacket) -> SendFuture<'a>;
}

/// JSON-over-HTTP POST to the ingest endpoint.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(config: &DeliveryConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_millis(config.send_timeout_ms))
                .build()
                .unwrap_or_default(),
            endpoint: config.endpoint.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl NetworkTransport for HttpTransport {
    fn send<'a>(&'a self, packet: &'a TelemetryPacket) -> SendFuture<'a> {
        Box::pin(async move {
            let response = self.client.post(&self.endpoint).json(packet).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Status(status.as_u16()));
            }

            // The endpoint may echo a JSON body back; it carries nothing we act on.
            if let Ok(body) = response.json::<serde_json::Value>().await {
                debug!(packet_id = %packet.packet_id, echo = %body, "ingest acknowledged");
            }
            Ok(())
        })
    }
}
