use crate::path::FieldPath;

pub mod action;
pub mod descriptor;
pub mod filter;
pub mod notice;
pub mod options;
pub mod pager;
pub mod path;
pub mod preview;
pub mod render;
pub mod schema;
pub mod session;
pub mod store;
pub mod transport;

#[cfg(test)]
mod tests;

#[derive(Debug, thiserror::Error)]
#[error("{context}: {detail}")]
pub struct Error {
    pub context: Box<ErrorContext>,
    pub detail: Box<ErrorDetail>,
}

#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub page: String,
    pub subject: Option<String>,
}

impl ErrorContext {
    fn new(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            subject: None,
        }
    }

    fn with_subject(&self, subject: impl Into<String>) -> Self {
        Self {
            page: self.page.clone(),
            subject: Some(subject.into()),
        }
    }

    fn error(&self, detail: ErrorDetail) -> Error {
        Error {
            context: Box::new(self.clone()),
            detail: Box::new(detail),
        }
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "{}({subject})", self.page),
            None => write!(f, "{}", self.page),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorDetail {
    #[error("Failed to read descriptor: {0}")]
    ReadDescriptor(std::io::Error),
    #[error("Failed to parse descriptor: {0}")]
    ParseDescriptor(serde_json::Error),
    #[error("Duplicate column accessor: {0}")]
    DuplicateAccessor(String),
    #[error("More than one actions column: {first}, {second}")]
    MultipleActionColumns { first: String, second: String },
    #[error("Missing list endpoint (getDataUrl)")]
    MissingDataUrl,
    #[error("Invalid field path {path:?}: {source}")]
    InvalidFieldPath {
        path: String,
        source: path::ParseError,
    },
    #[error("Status field is undefined for toggle action")]
    StatusFieldUndefined,
    #[error("Filter {node} depends on undeclared filter {parent}")]
    UnknownFilterParent { node: String, parent: String },
    #[error("Filter {node} must be declared after its parents")]
    FilterOrder { node: String },
    #[error("Scalar path expected for search field, got {0}")]
    IndexedSearchField(FieldPath),
}
