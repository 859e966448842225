//! Booking submission handler
//!
//! Holds the widget's state for one event: the email being entered and
//! whether the booking went through. A successful submit replaces the form
//! with a thank-you message; a failed one leaves the form in place so the
//! visitor can try again.

use crate::analytics::{Analytics, AnalyticsEvent};
use crate::booking::BookingWriter;
use crate::models::NewBooking;

/// Logged and captured when a submission fails
pub const FAILURE_MESSAGE: &str = "Booking creation failed";

/// What the widget should display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormView {
    Form { email: String },
    ThankYou,
}

/// Submission state for one event's booking widget
#[derive(Debug, Clone)]
pub struct BookingForm {
    event_id: String,
    slug: String,
    email: String,
    submitted: bool,
}

impl BookingForm {
    pub fn new(event_id: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            slug: slug.into(),
            email: String::new(),
            submitted: false,
        }
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn view(&self) -> FormView {
        if self.submitted {
            FormView::ThankYou
        } else {
            FormView::Form {
                email: self.email.clone(),
            }
        }
    }

    /// Submit the current email. Returns whether the booking was stored.
    ///
    /// Analytics are captured after the outcome is known and cannot change it.
    pub async fn submit(&mut self, writer: &BookingWriter, analytics: &dyn Analytics) -> bool {
        // the form is gone once submitted
        if self.submitted {
            return true;
        }

        let booking = NewBooking::new(&self.event_id, &self.slug, &self.email);
        let result = writer.submit(&booking).await;

        if result.success {
            self.submitted = true;
            analytics.capture(AnalyticsEvent::booked(&booking));
        } else {
            tracing::error!(event_id = %self.event_id, slug = %self.slug, "Booking failed");
            analytics.capture(AnalyticsEvent::exception(FAILURE_MESSAGE, &booking));
        }

        result.success
    }
}
