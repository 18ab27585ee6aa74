use serde::{Deserialize, Serialize};

use crate::contract::{UiRequest, UiResponse};
use crate::controller::{ActivationError, DisplaySink, QueryController};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    NothingSelected,
    OutOfRange,
    Launch,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransportResponse {
    Ok { response: UiResponse },
    Err { error: ErrorResponse },
}

pub fn handle_request<D: DisplaySink>(
    controller: &mut QueryController<D>,
    request: UiRequest,
) -> TransportResponse {
    let outcome = match request {
        UiRequest::SetQuery { text } => {
            controller.set_query(&text);
            Ok(UiResponse::Accepted)
        }
        UiRequest::SetCategory { category } => {
            controller.set_category(category);
            Ok(UiResponse::Accepted)
        }
        UiRequest::SetVisible { visible } => {
            controller.set_visible(visible);
            Ok(UiResponse::Accepted)
        }
        UiRequest::ActivateSelected { index } => controller
            .activate_selected(index)
            .map(|selected| UiResponse::Activated {
                name: selected.name,
            }),
    };

    match outcome {
        Ok(response) => TransportResponse::Ok { response },
        Err(error) => TransportResponse::Err {
            error: map_activation_error(error),
        },
    }
}

pub fn handle_json<D: DisplaySink>(controller: &mut QueryController<D>, payload: &str) -> String {
    let response = match serde_json::from_str::<UiRequest>(payload) {
        Ok(request) => handle_request(controller, request),
        Err(error) => TransportResponse::Err {
            error: ErrorResponse {
                code: ErrorCode::InvalidJson,
                message: error.to_string(),
            },
        },
    };

    encode(&response)
}

pub fn encode<T: Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(line) => line,
        Err(error) => {
            tracing::error!(%error, "failed to encode response");
            String::from(r#"{"status":"err","error":{"code":"invalid_json","message":"encode failed"}}"#)
        }
    }
}

fn map_activation_error(error: ActivationError) -> ErrorResponse {
    let code = match &error {
        ActivationError::NothingDisplayed => ErrorCode::NothingSelected,
        ActivationError::OutOfRange { .. } => ErrorCode::OutOfRange,
        ActivationError::Launch(_) => ErrorCode::Launch,
    };
    ErrorResponse {
        code,
        message: error.to_string(),
    }
}
