//! Transient user-visible notices.
//!
//! Engine code reports failures and confirmations through a task-local
//! collector; the shell scopes collection around one interaction and turns
//! the drained notices into whatever toast/snackbar surface it has. Outside
//! a collection scope notices are logged and dropped.

use std::cell::RefCell;

use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

tokio::task_local! {
    static NOTICES: RefCell<Vec<Notice>>;
}

pub fn emit(severity: Severity, message: impl Into<String>) {
    let notice = Notice {
        severity,
        message: message.into(),
    };
    let result = NOTICES.try_with(|notices| {
        notices.borrow_mut().push(notice.clone());
    });
    if result.is_err() {
        match notice.severity {
            Severity::Info => info!(message = %notice.message, "notice outside scope"),
            Severity::Error => error!(message = %notice.message, "notice outside scope"),
        }
    }
}

pub fn report_info(message: impl Into<String>) {
    emit(Severity::Info, message);
}

pub fn report_error(message: impl Into<String>) {
    emit(Severity::Error, message);
}

/// Run a closure with notice collection enabled, returning the collected
/// notices alongside the result.
pub async fn collect_notices<F, T>(f: F) -> (T, Vec<Notice>)
where
    F: std::future::Future<Output = T>,
{
    NOTICES
        .scope(RefCell::new(Vec::new()), async {
            let result = f.await;
            let notices = NOTICES.with(|n| std::mem::take(&mut *n.borrow_mut()));
            (result, notices)
        })
        .await
}
