//! Outbound transactional email (Brevo HTTP API)

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::api::enquiry::EnquiryRequest;
use crate::util::escape_html;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub email: String,
    pub name: String,
}

impl Address {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEmail {
    pub to: Address,
    pub reply_to: Option<Address>,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail provider returned {status}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

/// Brevo `smtp/email` client
pub struct BrevoMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    sender: Address,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoRequest<'a> {
    sender: &'a Address,
    to: [&'a Address; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a Address>,
    subject: &'a str,
    html_content: &'a str,
}

impl BrevoMailer {
    pub fn new(api_url: String, api_key: String, sender: Address) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            sender,
        }
    }
}

#[async_trait]
impl Mailer for BrevoMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let body = BrevoRequest {
            sender: &self.sender,
            to: [&email.to],
            reply_to: email.reply_to.as_ref(),
            subject: &email.subject,
            html_content: &email.html,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to = %email.to.email, subject = %email.subject, "Email sent");
        Ok(())
    }
}

/// Subject line of a contact-form enquiry
pub fn enquiry_subject(req: &EnquiryRequest) -> String {
    match req.product_name.as_deref().filter(|s| !s.is_empty()) {
        Some(product) => format!(
            "Product Enquiry: {product} ({})",
            req.product_sku.as_deref().filter(|s| !s.is_empty()).unwrap_or("N/A")
        ),
        None => format!("New Enquiry from {}", req.name),
    }
}

pub fn enquiry_email(req: &EnquiryRequest, to: Address) -> OutboundEmail {
    let opt = |v: &Option<String>, default: &str| {
        escape_html(v.as_deref().filter(|s| !s.is_empty()).unwrap_or(default))
    };

    let mut html = String::from("<div style=\"font-family:Arial,sans-serif;\">");
    if req.product_name.as_deref().is_some_and(|s| !s.is_empty()) {
        html.push_str("<h2>Product Enquiry</h2>");
        html.push_str(&format!(
            "<p><strong>Product:</strong> {}</p><p><strong>SKU:</strong> {}</p>",
            opt(&req.product_name, ""),
            opt(&req.product_sku, "N/A"),
        ));
    } else {
        html.push_str("<h2>New Contact Enquiry</h2>");
    }
    html.push_str(&format!(
        "<p><strong>Name:</strong> {}</p>\
         <p><strong>Email:</strong> {}</p>\
         <p><strong>Phone:</strong> {}</p>\
         <p><strong>Subject:</strong> {}</p>\
         <hr/><p><strong>Message:</strong></p>\
         <p style=\"white-space:pre-wrap;\">{}</p></div>",
        escape_html(&req.name),
        escape_html(&req.email),
        opt(&req.phone, "N/A"),
        opt(&req.subject, "General Enquiry"),
        escape_html(&req.message),
    ));

    OutboundEmail {
        to,
        reply_to: Some(Address::new(req.email.clone(), req.name.clone())),
        subject: enquiry_subject(req),
        html,
    }
}

/// Reset email: a link when a base URL is configured, the bare token otherwise
pub fn reset_email(to: &str, token: &str, reset_url_base: &str) -> OutboundEmail {
    let link = escape_html(&format!("{reset_url_base}?token={token}"));
    let action = format!("<p><a href=\"{link}\">Reset your password</a></p>");
    OutboundEmail {
        to: Address::new(to, to),
        reply_to: None,
        subject: "Reset your Sapta Home password".into(),
        html: format!(
            "<div style=\"font-family:Arial,sans-serif;\">\
             <p>A password reset was requested for your account.</p>{action}\
             <p>This link is valid for 30 minutes. If you did not request it, ignore this email.</p>\
             </div>"
        ),
    }
}
