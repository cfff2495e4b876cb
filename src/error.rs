//! Top-level error for panel actions.
//!
//! Every failure is caught at the action that triggered it and turned into
//! one user-facing message plus an HTTP status. Nothing is retried.

use crate::client::ClientError;
use crate::export::ExportError;
use crate::glyph::GlyphError;
use crate::grid::GridError;
use crate::raster::RasterError;
use crate::session::SessionError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error(transparent)]
    Backend(#[from] ClientError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Glyph(#[from] GlyphError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("emoji rendering is unavailable: no font configured")]
    NoFont,

    #[error("{0}")]
    BadRequest(String),

    #[error("request body exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

impl PanelError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PanelError::Backend(_) => StatusCode::BAD_GATEWAY,
            PanelError::Raster(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PanelError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PanelError::Glyph(GlyphError::EmptyText) => StatusCode::BAD_REQUEST,
            PanelError::Glyph(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PanelError::Grid(_) => StatusCode::BAD_REQUEST,
            PanelError::Session(_) => StatusCode::CONFLICT,
            PanelError::NoFont => StatusCode::SERVICE_UNAVAILABLE,
            PanelError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PanelError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PanelError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short status line for the user. Details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            PanelError::Backend(ClientError::Http(_)) => {
                "Backend unreachable. Is the service running?".to_string()
            }
            PanelError::Backend(ClientError::Api { message, .. }) => {
                format!("Backend error: {message}")
            }
            PanelError::Backend(ClientError::Rejected(reason)) => {
                format!("Device did not accept the request ({reason})")
            }
            PanelError::Raster(_) => "Could not read that image.".to_string(),
            PanelError::Export(_) => "Could not prepare the image for sending.".to_string(),
            PanelError::Glyph(GlyphError::EmptyText) => "Pick an emoji first.".to_string(),
            PanelError::Glyph(_) => "Could not render that emoji.".to_string(),
            PanelError::Grid(e) => e.to_string(),
            PanelError::Session(SessionError::NotConnected) => {
                "Connect to a device first.".to_string()
            }
            PanelError::Session(SessionError::Busy(_)) => "Still working on it...".to_string(),
            PanelError::Session(SessionError::Cancelled) => {
                "Cancelled: the device session ended.".to_string()
            }
            PanelError::NoFont => self.to_string(),
            PanelError::BadRequest(msg) => msg.clone(),
            PanelError::TooLarge { limit } => {
                format!("Image is too large (max {} MiB).", limit / (1024 * 1024))
            }
            PanelError::Internal(_) => "Something went wrong, see the server log.".to_string(),
        }
    }
}

impl IntoResponse for PanelError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }
        (status, self.user_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(PanelError::Session(SessionError::NotConnected), StatusCode::CONFLICT)]
    #[case(PanelError::Session(SessionError::Busy(crate::session::Action::Upload)), StatusCode::CONFLICT)]
    #[case(PanelError::Backend(ClientError::Rejected("x".into())), StatusCode::BAD_GATEWAY)]
    #[case(PanelError::Backend(ClientError::Api { status: 500, message: "boom".into() }), StatusCode::BAD_GATEWAY)]
    #[case(PanelError::Raster(RasterError::Empty), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(PanelError::Grid(GridError { row: 40, col: 0 }), StatusCode::BAD_REQUEST)]
    #[case(PanelError::NoFont, StatusCode::SERVICE_UNAVAILABLE)]
    #[case(PanelError::TooLarge { limit: 1024 }, StatusCode::PAYLOAD_TOO_LARGE)]
    fn status_codes(#[case] err: PanelError, #[case] expected: StatusCode) {
        assert_eq!(err.status_code(), expected);
    }

    #[test]
    fn backend_detail_reaches_the_user() {
        let err = PanelError::Backend(ClientError::Api {
            status: 500,
            message: "Device AA not found".into(),
        });
        assert_eq!(err.user_message(), "Backend error: Device AA not found");
    }

    #[test]
    fn not_connected_message() {
        let err = PanelError::from(SessionError::NotConnected);
        assert_eq!(err.user_message(), "Connect to a device first.");
    }
}
