use axum::http::HeaderMap;
use serde_json::Value;

use crate::error_handler::AppError;

pub const EVENT_HEADER: &str = "X-GitHub-Event";
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

/// The only event type the webhook acts on.
pub const PULL_REQUEST_EVENT: &str = "pull_request";

/// Returns the event name, rejecting anything but `pull_request`.
pub fn accepted_event(headers: &HeaderMap) -> Result<&str, AppError> {
    let event = headers
        .get(EVENT_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AppError::MissingEventHeader)?;

    if event != PULL_REQUEST_EVENT {
        return Err(AppError::UnsupportedEvent(event.to_string()));
    }
    Ok(event)
}

pub fn delivery_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(DELIVERY_HEADER).and_then(|h| h.to_str().ok())
}

/// Top-level shape of a `pull_request` delivery.
///
/// Only presence is checked here; field types are validated when the
/// record is built.
pub struct PullRequestEvent<'a> {
    pub action: &'a Value,
    pub pull_request: &'a Value,
}

impl<'a> PullRequestEvent<'a> {
    pub fn from_payload(payload: &'a Value) -> Result<Self, AppError> {
        let pull_request = payload
            .get("pull_request")
            .ok_or_else(|| AppError::Unprocessable("Field required: pull_request".into()))?;
        let action = payload
            .get("action")
            .ok_or_else(|| AppError::Unprocessable("Field required: action".into()))?;
        Ok(Self {
            action,
            pull_request,
        })
    }

    pub fn action_name(&self) -> &str {
        self.action.as_str().unwrap_or("<non-string>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[test]
    fn event_header_is_checked() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            accepted_event(&headers),
            Err(AppError::MissingEventHeader)
        ));

        headers.insert(EVENT_HEADER, HeaderValue::from_static("push"));
        assert!(matches!(
            accepted_event(&headers),
            Err(AppError::UnsupportedEvent(e)) if e == "push"
        ));

        headers.insert(EVENT_HEADER, HeaderValue::from_static("pull_request"));
        assert_eq!(accepted_event(&headers).unwrap(), "pull_request");
    }

    #[test]
    fn missing_top_level_fields_are_unprocessable() {
        let payload = json!({ "action": "opened" });
        assert!(matches!(
            PullRequestEvent::from_payload(&payload),
            Err(AppError::Unprocessable(_))
        ));

        let payload = json!({ "pull_request": {} });
        assert!(matches!(
            PullRequestEvent::from_payload(&payload),
            Err(AppError::Unprocessable(_))
        ));

        let payload = json!({ "action": "opened", "pull_request": {} });
        let ev = PullRequestEvent::from_payload(&payload).unwrap();
        assert_eq!(ev.action_name(), "opened");
    }
}
