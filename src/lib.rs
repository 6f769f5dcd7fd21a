use std::error::Error as StdError;
use std::fmt;

mod behaviors;
mod config;
mod dom;
mod events;
mod html;
mod location;
mod page;
mod scheduler;
mod selector;
mod storage;
mod trace;

pub use behaviors::feedback_form::{
    FieldError, validate_email, validate_message, validate_name,
};
pub use config::PageConfig;
pub use page::{Page, ScrollRequest};
pub use scheduler::PendingTimer;
pub use storage::{FeedbackEntry, LocalStorage};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    PageRuntime(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    Storage(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::PageRuntime(msg) => write!(f, "page runtime error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::Storage(msg) => write!(f, "storage error: {msg}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}
