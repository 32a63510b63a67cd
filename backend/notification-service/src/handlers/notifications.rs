/// Notification handlers - HTTP endpoints for notification delivery
use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::Notification;
use crate::services::Mailer;

/// Send a notification email.
///
/// Returns 502 when the SMTP relay fails so callers can distinguish "bad
/// request" from "try again later". Callers are expected to treat this
/// endpoint as best-effort.
pub async fn send_notification(
    mailer: web::Data<Mailer>,
    req: web::Json<Notification>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    mailer.send(&req).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({"status": "sent"})))
}
