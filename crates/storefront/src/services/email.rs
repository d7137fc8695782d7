//! Transactional email through the Resend HTTP API.
//!
//! Messages are plain text. When no API key is configured the service is
//! disabled: order notifications are skipped with a warning and contact-form
//! mail reports [`EmailError::Disabled`].

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::Order;

/// Resend send-email endpoint.
const SEND_URL: &str = "https://api.resend.com/emails";

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// No API key configured.
    #[error("email delivery is not configured")]
    Disabled,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Client could not be built from configuration.
    #[error("invalid email configuration: {0}")]
    Config(String),
}

/// A contact-form submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: String,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

/// Email sender. Cheap to clone.
#[derive(Clone)]
pub struct EmailService {
    client: Option<reqwest::Client>,
    from: String,
    notification_address: Option<String>,
}

impl EmailService {
    /// Build the sender from configuration.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Config` if the API key is not a valid header value
    /// and `EmailError::Http` if the HTTP client fails to build.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let client = match &config.api_key {
            Some(key) => {
                let mut headers = HeaderMap::new();
                let auth_value = format!("Bearer {}", key.expose_secret());
                headers.insert(
                    "Authorization",
                    HeaderValue::from_str(&auth_value)
                        .map_err(|e| EmailError::Config(format!("Invalid API key format: {e}")))?,
                );
                Some(
                    reqwest::Client::builder()
                        .default_headers(headers)
                        .build()?,
                )
            }
            None => None,
        };

        Ok(Self {
            client,
            from: config.from.clone(),
            notification_address: config.notification_address.clone(),
        })
    }

    /// A sender that never sends.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            client: None,
            from: String::new(),
            notification_address: None,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    async fn send(&self, email: &OutgoingEmail<'_>) -> Result<(), EmailError> {
        let client = self.client.as_ref().ok_or(EmailError::Disabled)?;

        let response = client.post(SEND_URL).json(email).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    /// Send the order confirmation to the buyer and the new-order notice to
    /// the shop. Failures are logged, never returned.
    pub async fn notify_order_placed(&self, order: &Order) {
        if !self.is_enabled() {
            tracing::warn!(
                order_number = %order.order_number,
                "RESEND_API_KEY not set, skipping order emails"
            );
            return;
        }

        let confirmation = OutgoingEmail {
            from: &self.from,
            to: vec![order.shipping_email.as_str()],
            subject: format!("Order Confirmed - {}", order.order_number),
            text: confirmation_text(order),
            reply_to: None,
        };
        match self.send(&confirmation).await {
            Ok(()) => tracing::info!(order_number = %order.order_number, "order confirmation sent"),
            Err(e) => tracing::error!(
                order_number = %order.order_number,
                error = %e,
                "failed to send order confirmation"
            ),
        }

        let Some(admin) = self.notification_address.as_deref() else {
            return;
        };
        let notice = OutgoingEmail {
            from: &self.from,
            to: vec![admin],
            subject: format!("[NEW ORDER] {} - {}", order.order_number, order.total),
            text: notification_text(order),
            reply_to: None,
        };
        if let Err(e) = self.send(&notice).await {
            tracing::error!(
                order_number = %order.order_number,
                error = %e,
                "failed to send admin order notification"
            );
        }
    }

    /// Forward a contact-form message to the shop.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Disabled` when email is not configured or no
    /// notification address is set, and `EmailError::Http`/`EmailError::Api`
    /// if delivery fails.
    pub async fn send_contact(&self, message: &ContactMessage) -> Result<(), EmailError> {
        let to = self
            .notification_address
            .as_deref()
            .ok_or(EmailError::Disabled)?;

        let email = OutgoingEmail {
            from: &self.from,
            to: vec![to],
            subject: format!(
                "[Contact Form] {} - {} {}",
                message.subject, message.first_name, message.last_name
            ),
            text: format!(
                "New contact message\n\nName: {} {}\nEmail: {}\nSubject: {}\n\n{}\n",
                message.first_name, message.last_name, message.email, message.subject, message.message
            ),
            reply_to: Some(message.email.as_str()),
        };
        self.send(&email).await
    }
}

fn item_lines(order: &Order) -> String {
    order
        .items
        .iter()
        .map(|item| {
            format!(
                "  {} x{} @ {} = {}\n",
                item.product_name, item.quantity, item.product_price, item.total
            )
        })
        .collect()
}

fn confirmation_text(order: &Order) -> String {
    format!(
        "Thank you for your order, {name}!\n\n\
         Order number: {number}\n\n\
         Items:\n{items}\n\
         Subtotal: {subtotal}\n\
         Shipping: Free\n\
         Total: {total}\n\n\
         Payment method: {method}\n\n\
         Shipping to:\n  {name}\n  {address}\n  {city}, {state} {zip}\n  {phone}\n",
        name = order.shipping_name,
        number = order.order_number,
        items = item_lines(order),
        subtotal = order.subtotal,
        total = order.total,
        method = order.payment_method.label(),
        address = order.shipping_address,
        city = order.shipping_city,
        state = order.shipping_state,
        zip = order.shipping_zip,
        phone = order.shipping_phone,
    )
}

fn notification_text(order: &Order) -> String {
    let mut text = format!(
        "New order {number}\n\n\
         Customer: {name} <{email}>\n\
         Phone: {phone}\n\
         Address: {address}, {city}, {state} {zip}\n\n\
         Items:\n{items}\n\
         Total: {total} ({method})\n",
        number = order.order_number,
        name = order.shipping_name,
        email = order.shipping_email,
        phone = order.shipping_phone,
        address = order.shipping_address,
        city = order.shipping_city,
        state = order.shipping_state,
        zip = order.shipping_zip,
        items = item_lines(order),
        total = order.total,
        method = order.payment_method.label(),
    );
    if let Some(notes) = &order.notes {
        text.push_str("\nNotes: ");
        text.push_str(notes);
        text.push('\n');
    }
    text
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, NaiveDate, Utc};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use pharmacorp_core::{
        Money, OrderId, OrderItemId, OrderNumber, OrderStatus, PaymentMethod, PaymentStatus,
        ProductId, UserId,
    };

    use super::*;
    use crate::models::OrderItem;

    fn order() -> Order {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        Order {
            id: OrderId::new(1),
            order_number: OrderNumber::generate(date, &mut StdRng::seed_from_u64(1)),
            user_id: UserId::new(1),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_method: PaymentMethod::CashOnDelivery,
            shipping_name: "Ada Lovelace".into(),
            shipping_email: "ada@example.com".into(),
            shipping_phone: "555-0100".into(),
            shipping_address: "12 Analytical Way".into(),
            shipping_city: "London".into(),
            shipping_state: "LDN".into(),
            shipping_zip: "N1".into(),
            subtotal: Money::from_cents(9998),
            total: Money::from_cents(9998),
            notes: Some("Leave at the door".into()),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            items: vec![OrderItem {
                id: OrderItemId::new(1),
                product_id: Some(ProductId::new(1)),
                product_name: "CardioGuard Plus".into(),
                product_image: "/products/cardio.jpg".into(),
                product_price: Money::from_cents(4999),
                quantity: 2,
                total: Money::from_cents(9998),
            }],
        }
    }

    #[test]
    fn test_confirmation_lists_items_and_totals() {
        let text = confirmation_text(&order());
        assert!(text.contains("CardioGuard Plus x2 @ $49.99 = $99.98"));
        assert!(text.contains("Total: $99.98"));
        assert!(text.contains("Cash on Delivery"));
    }

    #[test]
    fn test_notification_includes_notes() {
        let text = notification_text(&order());
        assert!(text.contains("Ada Lovelace <ada@example.com>"));
        assert!(text.contains("Notes: Leave at the door"));
    }

    #[tokio::test]
    async fn test_disabled_service_refuses_contact_mail() {
        let service = EmailService::disabled();
        assert!(!service.is_enabled());

        let message = ContactMessage {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            subject: "Hello".into(),
            message: "Question about NeuroCalm".into(),
        };
        assert!(matches!(
            service.send_contact(&message).await,
            Err(EmailError::Disabled)
        ));

        // Order notifications are skipped quietly.
        service.notify_order_placed(&order()).await;
    }
}
