//! Request body extractor for patient submissions.

use axum::{
    async_trait,
    extract::{
        rejection::{FormRejection, JsonRejection},
        FromRequest, Request,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use pacientes_core::PatientForm;

/// Patient fields taken from either a urlencoded form or a JSON body.
///
/// The body format is chosen from the media type of `Content-Type`:
/// `application/json` is read as JSON and `application/x-www-form-urlencoded` as a
/// form. A missing or any other content type yields an empty form, so every field
/// takes its default.
#[derive(Debug)]
pub struct PatientPayload(pub PatientForm);

/// A body that declared a supported format but could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum PayloadRejection {
    #[error("invalid JSON body: {0}")]
    Json(#[from] JsonRejection),
    #[error("invalid form body: {0}")]
    Form(#[from] FormRejection),
}

impl IntoResponse for PayloadRejection {
    fn into_response(self) -> Response {
        tracing::error!("Patient payload error: {:?}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, "Erro interno do servidor").into_response()
    }
}

enum BodyKind {
    Json,
    Form,
    Unsupported,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return BodyKind::Unsupported;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "application/json" => BodyKind::Json,
        "application/x-www-form-urlencoded" => BodyKind::Form,
        _ => BodyKind::Unsupported,
    }
}

#[async_trait]
impl<S> FromRequest<S> for PatientPayload
where
    S: Send + Sync,
{
    type Rejection = PayloadRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match body_kind(req.headers()) {
            BodyKind::Json => {
                let Json(form) = Json::<PatientForm>::from_request(req, state).await?;
                Ok(Self(form))
            }
            BodyKind::Form => {
                let Form(form) = Form::<PatientForm>::from_request(req, state).await?;
                Ok(Self(form))
            }
            BodyKind::Unsupported => {
                tracing::debug!("unsupported patient body; using empty form");
                Ok(Self(PatientForm::default()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(content_type).unwrap(),
        );
        headers
    }

    #[test]
    fn media_type_ignores_parameters_and_case() {
        assert!(matches!(
            body_kind(&headers("Application/JSON; charset=utf-8")),
            BodyKind::Json
        ));
        assert!(matches!(
            body_kind(&headers("application/x-www-form-urlencoded;charset=UTF-8")),
            BodyKind::Form
        ));
    }

    #[test]
    fn other_or_missing_media_types_are_unsupported() {
        assert!(matches!(body_kind(&HeaderMap::new()), BodyKind::Unsupported));
        for ct in ["text/plain", "multipart/form-data; boundary=x", "application/jsonx"] {
            assert!(matches!(body_kind(&headers(ct)), BodyKind::Unsupported), "{ct}");
        }
    }
}
