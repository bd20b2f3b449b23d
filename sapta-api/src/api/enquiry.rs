//! Contact-form enquiry relay
//!
//! POST /api/enquiry → validate → mail the support inbox (reply-to the enquirer)

use axum::extract::State;
use serde::Deserialize;
use shared::error::{ApiResponse, AppError};
use validator::Validate;

use crate::api::extract::ApiJson;
use crate::email::{MailError, enquiry_email};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EnquiryRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "productName", default)]
    pub product_name: Option<String>,
    #[serde(rename = "productSku", default)]
    pub product_sku: Option<String>,
}

/// POST /api/enquiry
pub async fn send_enquiry(
    State(state): State<AppState>,
    ApiJson(mut req): ApiJson<EnquiryRequest>,
) -> Result<ApiResponse, AppError> {
    req.name = req.name.trim().to_string();
    req.email = req.email.trim().to_string();
    if req.name.is_empty() || req.email.is_empty() || req.message.trim().is_empty() {
        return Err(AppError::validation("Name, email and message are required"));
    }
    if req.validate().is_err() {
        return Err(AppError::invalid_field("email", "Invalid email address"));
    }

    let mail = enquiry_email(&req, state.enquiry_to.clone());
    if let Err(e) = state.mailer.send(mail).await {
        match &e {
            MailError::Rejected { status, body } => {
                tracing::error!(status = *status, body = %body, "Enquiry email rejected");
            }
            MailError::Transport(err) => {
                tracing::error!(error = %err, "Enquiry email failed");
            }
        }
        return Err(AppError::upstream("Failed to send enquiry. Please try again."));
    }

    tracing::info!(
        product = req.product_name.as_deref().unwrap_or("-"),
        "Enquiry relayed"
    );
    Ok(ApiResponse::message("Enquiry sent successfully"))
}

#[cfg(test)]
mod tests {
    use crate::api::create_router;
    use crate::testing::{TestContext, json_request, send};
    use axum::http::StatusCode;
    use serde_json::json;

    fn enquiry() -> serde_json::Value {
        json!({
            "name": "Asha",
            "email": "asha@example.com",
            "message": "Is the quilt available in king size?",
            "productName": "Rose Quilt",
            "productSku": "RQ-01"
        })
    }

    #[tokio::test]
    async fn test_enquiry_is_mailed_to_support() {
        let ctx = TestContext::new();
        let app = create_router(ctx.state.clone());

        let res = send(&app, json_request("POST", "/api/enquiry", enquiry(), None)).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.json["message"], "Enquiry sent successfully");

        let sent = ctx.mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, ctx.state.enquiry_to);
        assert_eq!(sent[0].subject, "Product Enquiry: Rose Quilt (RQ-01)");
        assert_eq!(
            sent[0].reply_to.as_ref().map(|a| a.email.as_str()),
            Some("asha@example.com")
        );
    }

    #[tokio::test]
    async fn test_enquiry_mail_failure_is_bad_gateway() {
        let ctx = TestContext::new();
        ctx.mailer.set_failing(true);
        let app = create_router(ctx.state.clone());

        let res = send(&app, json_request("POST", "/api/enquiry", enquiry(), None)).await;
        assert_eq!(res.status, StatusCode::BAD_GATEWAY);
        assert_eq!(res.json["message"], "Failed to send enquiry. Please try again.");
    }

    #[tokio::test]
    async fn test_enquiry_requires_fields() {
        let ctx = TestContext::new();
        let app = create_router(ctx.state.clone());

        let res = send(
            &app,
            json_request("POST", "/api/enquiry", json!({"name": "Asha", "message": "hi"}), None),
        )
        .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.json["message"], "Name, email and message are required");
        assert!(ctx.mailer.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_enquiry_rejects_bad_email() {
        let ctx = TestContext::new();
        let app = create_router(ctx.state.clone());

        let mut body = enquiry();
        body["email"] = json!("not-an-email");
        let res = send(&app, json_request("POST", "/api/enquiry", body, None)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.json["details"]["field"], "email");
    }
}
