//! Status code rewrite for designated error-page routes.

use crate::functions::{Response, ResponseStage};

/// Overwrites the response status unconditionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCodeRewrite {
    status: u16,
    description: String,
}

impl StatusCodeRewrite {
    pub fn new(status: u16, description: impl Into<String>) -> Self {
        Self {
            status,
            description: description.into(),
        }
    }

    /// `404 Not Found`, used behind the not-found page route.
    pub fn not_found() -> Self {
        Self::new(404, "Not Found")
    }
}

impl Default for StatusCodeRewrite {
    fn default() -> Self {
        Self::not_found()
    }
}

impl ResponseStage for StatusCodeRewrite {
    fn name(&self) -> &'static str {
        "status_code"
    }

    fn on_response(&self, mut response: Response) -> Response {
        response.status_code = self.status;
        response.status_description = self.description.clone();
        response
    }
}
