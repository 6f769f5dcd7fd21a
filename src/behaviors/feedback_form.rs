use std::fmt;
use std::sync::OnceLock;

use crate::behaviors::Handler;
use crate::events::{EventState, Listener};
use crate::page::Page;
use crate::scheduler::TimerCallback;
use crate::storage::{self, FeedbackEntry};
use crate::{Error, Result};

const FORM_ID: &str = "feedbackForm";
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Why a form field was rejected. Surfaced next to the field, never
/// propagated as an error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    EmptyField,
    InvalidFormat,
    TooShort,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyField => write!(f, "empty field"),
            Self::InvalidFormat => write!(f, "invalid format"),
            Self::TooShort => write!(f, "too short"),
        }
    }
}

pub fn validate_name(name: &str) -> Option<FieldError> {
    if name.trim().is_empty() {
        Some(FieldError::EmptyField)
    } else {
        None
    }
}

pub fn validate_email(email: &str) -> Result<Option<FieldError>> {
    let matched = email_regex()?
        .is_match(email)
        .map_err(|err| Error::PageRuntime(format!("email pattern failed: {err}")))?;
    Ok(if matched {
        None
    } else {
        Some(FieldError::InvalidFormat)
    })
}

pub fn validate_message(message: &str, min_chars: usize) -> Option<FieldError> {
    if message.trim().chars().count() < min_chars {
        Some(FieldError::TooShort)
    } else {
        None
    }
}

#[derive(Debug, Default)]
pub(crate) struct FeedbackState {
    pub(crate) pending_reset: Option<i64>,
}

pub(crate) fn install(page: &mut Page) -> Result<()> {
    let Some(form) = page.dom.by_id(FORM_ID) else {
        return Ok(());
    };
    page.listeners.add(
        form,
        "submit",
        Listener {
            capture: false,
            handler: Handler::FeedbackSubmit,
        },
    );
    Ok(())
}

pub(crate) fn on_submit(page: &mut Page, event: &mut EventState) -> Result<()> {
    event.prevent_default();

    let name = field_value(page, "name");
    let email = field_value(page, "email");
    let subject = field_value(page, "subject");
    let message = field_value(page, "message");

    clear_errors(page)?;

    let mut valid = true;
    if validate_name(&name).is_some() {
        show_error(page, "name", "nameError", "Please enter your name")?;
        valid = false;
    }
    if validate_email(&email)?.is_some() {
        show_error(
            page,
            "email",
            "emailError",
            "Please enter a valid email address",
        )?;
        valid = false;
    }
    let min_chars = page.config.min_message_chars;
    if validate_message(&message, min_chars).is_some() {
        let text = format!("Please enter a message (at least {min_chars} characters)");
        show_error(page, "message", "messageError", &text)?;
        valid = false;
    }
    if !valid {
        return Ok(());
    }

    let entry = FeedbackEntry {
        name,
        email,
        subject,
        message,
        timestamp: page.iso_timestamp()?,
    };
    mailto_handoff(page, &entry);
    persist(page, entry)?;
    show_success(page);
    schedule_reset(page);
    Ok(())
}

// Runs when the reset timer fires: blank the fields, hide the success
// indicator, back to idle.
pub(crate) fn reset_form(page: &mut Page) -> Result<()> {
    for field_id in ["name", "email", "subject", "message"] {
        if let Some(field) = page.dom.by_id(field_id) {
            page.dom.set_value(field, "")?;
        }
    }
    if let Some(success) = page.dom.by_id("successMessage") {
        page.dom.remove_class(success, "show");
    }
    page.feedback.pending_reset = None;
    Ok(())
}

fn field_value(page: &Page, id: &str) -> String {
    page.dom
        .by_id(id)
        .and_then(|node| page.dom.element(node))
        .map(|element| element.value.trim().to_string())
        .unwrap_or_default()
}

// Every validation pass starts from a clean slate so stale indicators
// never survive a resubmission.
fn clear_errors(page: &mut Page) -> Result<()> {
    for indicator in page.dom.query_selector_all(".error-message")? {
        page.dom.remove_class(indicator, "show");
        page.dom.set_text_content(indicator, "")?;
    }
    for field in page.dom.query_selector_all(".error")? {
        page.dom.remove_class(field, "error");
    }
    Ok(())
}

fn show_error(page: &mut Page, field_id: &str, error_id: &str, message: &str) -> Result<()> {
    let (Some(field), Some(indicator)) = (page.dom.by_id(field_id), page.dom.by_id(error_id))
    else {
        return Ok(());
    };
    page.dom.add_class(field, "error");
    page.dom.set_text_content(indicator, message)?;
    page.dom.add_class(indicator, "show");
    Ok(())
}

fn show_success(page: &mut Page) {
    if let Some(success) = page.dom.by_id("successMessage") {
        page.dom.add_class(success, "show");
    }
}

fn persist(page: &mut Page, entry: FeedbackEntry) -> Result<()> {
    let key = page.config.storage_key.clone();
    let count = storage::append_entry(&mut page.storage, &key, entry)?;
    page.trace_storage_line(format!("[storage] feedback saved key={key} entries={count}"));
    Ok(())
}

// A resubmission cancels the stale reset first, so an earlier timer can
// never clear a later submission's fields mid-flight.
fn schedule_reset(page: &mut Page) {
    if let Some(stale) = page.feedback.pending_reset.take() {
        if page.scheduler.cancel(stale) {
            page.trace_timer_line(format!("[timer] reset canceled id={stale}"));
        }
    }
    let delay = page.config.reset_delay_ms;
    let id = page.scheduler.schedule(delay, TimerCallback::ResetFeedbackForm);
    page.trace_timer_line(format!("[timer] reset scheduled id={id} delay_ms={delay}"));
    page.feedback.pending_reset = Some(id);
}

fn mailto_handoff(page: &mut Page, entry: &FeedbackEntry) {
    let Some(recipient) = page.config.mailto.clone() else {
        return;
    };
    let subject = if entry.subject.is_empty() {
        page.config.mailto_subject.clone()
    } else {
        entry.subject.clone()
    };
    let body = format!(
        "Name: {}\nEmail: {}\n\nMessage:\n{}",
        entry.name, entry.email, entry.message
    );
    let url = format!(
        "mailto:{recipient}?subject={}&body={}",
        encode_uri_component(&subject),
        encode_uri_component(&body)
    );
    page.record_navigation(&url);
}

fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.as_bytes() {
        let b = *byte;
        let passthrough = b.is_ascii_alphanumeric()
            || matches!(b, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')');
        if passthrough {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

fn email_regex() -> Result<&'static fancy_regex::Regex> {
    static EMAIL: OnceLock<fancy_regex::Regex> = OnceLock::new();
    if let Some(regex) = EMAIL.get() {
        return Ok(regex);
    }
    let compiled = fancy_regex::Regex::new(EMAIL_PATTERN)
        .map_err(|err| Error::PageRuntime(format!("email pattern failed to compile: {err}")))?;
    Ok(EMAIL.get_or_init(|| compiled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_must_survive_trimming() {
        assert_eq!(validate_name("Alice"), None);
        assert_eq!(validate_name(""), Some(FieldError::EmptyField));
        assert_eq!(validate_name("   "), Some(FieldError::EmptyField));
    }

    #[test]
    fn email_shape_is_local_at_domain_dot_tld() -> Result<()> {
        assert_eq!(validate_email("a@b.com")?, None);
        assert_eq!(validate_email("first.last@sub.domain.org")?, None);
        assert_eq!(validate_email("not-an-email")?, Some(FieldError::InvalidFormat));
        assert_eq!(validate_email("missing@tld")?, Some(FieldError::InvalidFormat));
        assert_eq!(validate_email("two words@b.com")?, Some(FieldError::InvalidFormat));
        assert_eq!(validate_email("@b.com")?, Some(FieldError::InvalidFormat));
        assert_eq!(validate_email("")?, Some(FieldError::InvalidFormat));
        Ok(())
    }

    #[test]
    fn message_length_counts_characters_after_trimming() {
        assert_eq!(validate_message("123456789", 10), Some(FieldError::TooShort));
        assert_eq!(validate_message("1234567890", 10), None);
        assert_eq!(validate_message("   1234567890   ", 10), None);
        assert_eq!(validate_message("éééééééééé", 10), None);
    }

    #[test]
    fn uri_component_encoding_matches_browser_rules() {
        assert_eq!(encode_uri_component("plain-text_1.0"), "plain-text_1.0");
        assert_eq!(encode_uri_component("a b"), "a%20b");
        assert_eq!(encode_uri_component("x&y=z"), "x%26y%3Dz");
        assert_eq!(encode_uri_component("line\nbreak"), "line%0Abreak");
    }
}
