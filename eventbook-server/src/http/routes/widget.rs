//! Embeddable booking widget
//!
//! Server-rendered counterpart of the submission handler: the GET shows the
//! email form, the POST drives a [`BookingForm`] and renders whichever view
//! it ends up in.

use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, Path, State},
    response::Html,
    routing::get,
    Form, Router,
};
use serde::Deserialize;

use crate::form::{BookingForm, FormView};
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Form body posted by the widget
#[derive(Debug, Deserialize)]
pub struct WidgetSubmission {
    #[serde(default)]
    pub email: String,
}

/// GET /events/{event_id}/{slug}/book
async fn show_widget(Path((event_id, slug)): Path<(String, String)>) -> Html<String> {
    let form = BookingForm::new(&event_id, &slug);
    render(&form.view())
}

/// POST /events/{event_id}/{slug}/book
async fn submit_widget(
    State(state): State<Arc<AppState>>,
    Path((event_id, slug)): Path<(String, String)>,
    payload: Result<Form<WidgetSubmission>, FormRejection>,
) -> Result<Html<String>, ApiError> {
    let Form(submission) = payload?;

    let mut form = BookingForm::new(&event_id, &slug);
    form.set_email(submission.email);
    form.submit(&state.writer, state.analytics.as_ref()).await;

    Ok(render(&form.view()))
}

/// Widget routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/events/{event_id}/{slug}/book",
        get(show_widget).post(submit_widget),
    )
}

/// The form has no `action`: it posts back to the URL it was served from,
/// so the event id and slug never have to be re-encoded into a path.
fn render(view: &FormView) -> Html<String> {
    let body = match view {
        FormView::ThankYou => r#"<p class="text-sm">Thank you for signing up!</p>"#.to_string(),
        FormView::Form { email } => format!(
            r#"<form method="post">
    <div>
      <label for="email">Email Address</label>
      <input type="email" name="email" id="email" value="{email}" placeholder="Enter your email address" />
    </div>
    <button type="submit" class="button-submit">Submit</button>
  </form>"#,
            email = html_escape(email),
        ),
    };

    Html(format!("<div id=\"book-event\">\n  {body}\n</div>\n"))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
