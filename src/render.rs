//! Render layer seam.
//!
//! The core only supplies a view name and a data context; markup belongs to
//! whatever implements [`Renderer`]. The bundled [`DebugRenderer`] dumps the
//! context so handlers stay testable without a template pack.

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("view `{0}` failed to render")]
    View(String),
}

/// Given a view name and a data context, produce a response body.
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        view: &str,
        context: Value,
    ) -> Result<String, RenderError>;
}

/// Development renderer: emits the context as pretty-printed JSON.
pub struct DebugRenderer;

impl Renderer for DebugRenderer {
    fn render(
        &self,
        view: &str,
        context: Value,
    ) -> Result<String, RenderError> {
        let body = serde_json::to_string_pretty(&context)?;
        Ok(format!(
            "<!doctype html>\n<title>{view}</title>\n<pre>{body}</pre>\n"
        ))
    }
}
