// https://developers.facebook.com/docs/whatsapp/cloud-api/reference/messages

pub mod models;

use reqwest::Client;
use serde_json::json;

use crate::models::SendMessageResponse;

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v21.0";

#[derive(Debug, Clone)]
pub struct WhatsAppOptions {
    pub access_token: String,
    pub phone_number_id: String,
}

#[derive(Debug, Clone)]
pub struct WhatsAppService {
    options: WhatsAppOptions,
}

impl WhatsAppService {
    pub fn new(options: WhatsAppOptions) -> Self {
        Self { options }
    }

    /// Send a plain text message to a phone number (E.164 without the `+`,
    /// as the Cloud API expects).
    pub async fn send_text(
        self: &WhatsAppService,
        recipient: &str,
        body: &str,
    ) -> Result<SendMessageResponse, &'static str> {
        let url = format!(
            "{base}/{phone_id}/messages",
            base = GRAPH_API_BASE,
            phone_id = self.options.phone_number_id
        );

        let payload = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": recipient,
            "type": "text",
            "text": { "body": body },
        });

        let client = Client::new();
        let res = client
            .post(url)
            .bearer_auth(&self.options.access_token)
            .json(&payload)
            .send()
            .await;

        match res {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    // Log the error response from the Cloud API
                    let error_body = response.text().await.unwrap_or_default();
                    eprintln!("WhatsApp error ({}): {}", status, error_body);
                    return Err("WhatsApp returned an error");
                }

                let result = response.json::<SendMessageResponse>().await;
                match result {
                    Ok(data) => Ok(data),
                    Err(e) => {
                        eprintln!("Failed to parse WhatsApp response: {}", e);
                        Err("Error parsing send-message response")
                    }
                }
            }
            Err(e) => {
                eprintln!("Request to WhatsApp failed: {}", e);
                Err("Error sending message")
            }
        }
    }
}
