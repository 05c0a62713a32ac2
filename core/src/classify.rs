//! Interpretation of a finished transport into the request outcome.

use crate::context::ResponseTransform;
use crate::error::{Outcome, RequestError};
use crate::http::RawResponse;
use crate::transport::ResponseView;

/// Status some legacy transports report in place of 204.
pub const LEGACY_NO_CONTENT: u16 = 1223;

pub fn normalize_status(status: u16) -> u16 {
    if status == LEGACY_NO_CONTENT {
        204
    } else {
        status
    }
}

/// The structured body when the transport has one, its text otherwise.
pub fn read_body(view: &dyn ResponseView) -> RawResponse {
    view.response()
        .unwrap_or_else(|| RawResponse::Text(view.response_text()))
}

/// Map a terminal response to a value or a typed failure.
pub fn classify<T>(view: &dyn ResponseView, transform: &ResponseTransform<T>) -> Outcome<T> {
    let body = read_body(view);
    let status = normalize_status(view.status());

    match status {
        200..=399 => {
            let body = if body.is_empty() {
                RawResponse::default()
            } else {
                body
            };
            transform
                .apply(body)
                .map_err(|source| RequestError::InvalidPayload { source })
        }
        401 | 403 | 407 => Err(RequestError::Auth {
            status,
            message: detail(&body, view),
        }),
        410 => Err(RequestError::Gone {
            message: detail(&body, view),
        }),
        408 | 504 => Err(RequestError::TimeoutStatus {
            status,
            message: detail(&body, view),
        }),
        _ => {
            let message = if body.is_empty() {
                format!("Response code {status}")
            } else {
                body.to_string()
            };
            Err(RequestError::Http { status, message })
        }
    }
}

/// Body text, or the status text when the body is empty.
fn detail(body: &RawResponse, view: &dyn ResponseView) -> String {
    if body.is_empty() {
        view.status_text().to_string()
    } else {
        body.to_string()
    }
}
