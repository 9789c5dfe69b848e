//! Transactional email over HTTP callable endpoints.

use async_trait::async_trait;
use domain::{ApprovalEmail, DomainError, EmailNotifier, EmailReceipt, RejectionEmail};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const APPROVAL_ENDPOINT: &str = "sendApprovalEmail";
const REJECTION_ENDPOINT: &str = "sendRejectionEmail";

#[derive(Serialize)]
struct CallableRequest<'a, T> {
    data: &'a T,
}

#[derive(Deserialize)]
struct CallableResponse {
    result: EmailReceipt,
}

/// Posts `{"data": ...}` to `{base}/sendApprovalEmail` and
/// `{base}/sendRejectionEmail` and reads back `{"result": ...}`.
pub struct HttpEmailNotifier {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpEmailNotifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| DomainError::ValidationError(format!("invalid email endpoint: {}", e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::EmailDeliveryError(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn endpoint(&self, name: &str) -> Result<Url, DomainError> {
        self.base_url
            .join(name)
            .map_err(|e| DomainError::EmailDeliveryError(e.to_string()))
    }

    async fn call<T: Serialize + Sync>(&self, name: &str, data: &T) -> Result<EmailReceipt, DomainError> {
        let url = self.endpoint(name)?;
        debug!(url = %url, "calling email endpoint");

        let response = self
            .client
            .post(url.clone())
            .json(&CallableRequest { data })
            .send()
            .await
            .map_err(|e| DomainError::EmailDeliveryError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::EmailDeliveryError(format!(
                "{} returned {}: {}",
                url, status, body
            )));
        }

        let body: CallableResponse = response
            .json()
            .await
            .map_err(|e| DomainError::EmailDeliveryError(e.to_string()))?;
        Ok(body.result)
    }
}

#[async_trait]
impl EmailNotifier for HttpEmailNotifier {
    async fn send_approval_email(&self, email: &ApprovalEmail) -> Result<EmailReceipt, DomainError> {
        self.call(APPROVAL_ENDPOINT, email).await
    }

    async fn send_rejection_email(&self, email: &RejectionEmail) -> Result<EmailReceipt, DomainError> {
        self.call(REJECTION_ENDPOINT, email).await
    }
}

/// Used when no email endpoint is configured: records the intent in the log.
#[derive(Debug, Default)]
pub struct LogEmailNotifier;

#[async_trait]
impl EmailNotifier for LogEmailNotifier {
    async fn send_approval_email(&self, email: &ApprovalEmail) -> Result<EmailReceipt, DomainError> {
        info!(uid = %email.uid, to = %email.email, "approval email (not sent, no endpoint configured)");
        Ok(EmailReceipt {
            success: true,
            message: "logged".to_string(),
        })
    }

    async fn send_rejection_email(&self, email: &RejectionEmail) -> Result<EmailReceipt, DomainError> {
        info!(
            uid = %email.uid,
            to = %email.email,
            reason = email.reason.as_deref().unwrap_or("-"),
            "rejection email (not sent, no endpoint configured)"
        );
        Ok(EmailReceipt {
            success: true,
            message: "logged".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers a single request with `body` and hands back the raw request.
    async fn one_shot_server(body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let mut request = String::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.push_str(&String::from_utf8_lossy(&buf[..n]));
                if n == 0 || request.contains("}}") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            request
        });
        (format!("http://{}/functions", addr), handle)
    }

    fn approval() -> ApprovalEmail {
        ApprovalEmail {
            uid: "u1".into(),
            email: "ana@example.com".into(),
            first_name: "Ana".into(),
            last_name: "Cruz".into(),
        }
    }

    #[test]
    fn endpoints_are_appended_to_the_base_path() {
        let notifier = HttpEmailNotifier::new("https://example.com/fns", Duration::from_secs(1)).unwrap();
        assert_eq!(
            notifier.endpoint(APPROVAL_ENDPOINT).unwrap().as_str(),
            "https://example.com/fns/sendApprovalEmail"
        );
        assert!(HttpEmailNotifier::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn posts_wrapped_payload_and_reads_result() {
        let (base, server) =
            one_shot_server(r#"{"result":{"success":true,"message":"Email sent"}}"#).await;
        let notifier = HttpEmailNotifier::new(&base, Duration::from_secs(5)).unwrap();

        let receipt = notifier.send_approval_email(&approval()).await.unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.message, "Email sent");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /functions/sendApprovalEmail"));
        assert!(request.contains(r#""data":{"uid":"u1""#));
        assert!(request.contains(r#""firstName":"Ana""#));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_delivery_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let notifier =
            HttpEmailNotifier::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = notifier.send_approval_email(&approval()).await.unwrap_err();
        assert!(matches!(err, DomainError::EmailDeliveryError(_)));
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        let receipt = LogEmailNotifier.send_approval_email(&approval()).await.unwrap();
        assert!(receipt.success);
    }
}
