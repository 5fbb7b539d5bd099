use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, State},
    routing::post,
    Form, Json, Router,
};

use super::domain::{ComplaintAcknowledgement, ComplaintForm, DiagnosticResult};
use super::relay::MailRelay;
use super::service::ComplaintService;
use crate::error::AppError;

/// Router builder exposing the submission and diagnostic endpoints.
pub fn complaint_router<R>(service: Arc<ComplaintService<R>>) -> Router
where
    R: MailRelay + 'static,
{
    Router::new()
        .route("/submit_complaint", post(submit_handler::<R>))
        .route("/test_email", post(test_email_handler::<R>))
        .with_state(service)
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<ComplaintService<R>>>,
    form: Result<Form<ComplaintForm>, FormRejection>,
) -> Result<Json<ComplaintAcknowledgement>, AppError>
where
    R: MailRelay + 'static,
{
    let Form(form) = form?;
    let receipt = service.submit(&form)?;
    Ok(Json(receipt.acknowledgement))
}

pub(crate) async fn test_email_handler<R>(
    State(service): State<Arc<ComplaintService<R>>>,
) -> Result<Json<DiagnosticResult>, AppError>
where
    R: MailRelay + 'static,
{
    let result = service.test_email().await?;
    Ok(Json(result))
}
