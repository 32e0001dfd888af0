//! Testing utilities for the studio portal workspace
//!
//! Shared fixtures, a recording mailer and a seeded store.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use portal_import::{import_outline, ImportReport, MarkdownProjectParser};
use portal_model::{ProjectId, Task};
use portal_notify::{DeliveryReceipt, MailError, Mailer, OutgoingEmail};
use portal_store::{load_tree, MemoryStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Two screens and three tasks
pub const SAMPLE_OUTLINE: &str = "\
# Pantry
> Shared grocery lists

A list app for households.

## Lists
Create and browse lists.
- [ ] Create list
- [x] Share list

## Settings
- [ ] Invite household
";

/// Fixed UTC timestamp on `day` of May 2026
pub fn may(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, day, hour, 0, 0).unwrap()
}

/// Mailer keeping every message it was asked to send
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mailer rejecting every message
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.set_failing(true);
        mailer
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Messages accepted so far
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().clone()
    }

    pub fn last(&self) -> Option<OutgoingEmail> {
        self.sent.lock().last().cloned()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::rejected(503, "mail api unavailable"));
        }
        let mut sent = self.sent.lock();
        sent.push(email.clone());
        Ok(DeliveryReceipt {
            id: Some(format!("msg_{}", sent.len())),
        })
    }
}

/// Store holding [`SAMPLE_OUTLINE`] imported at [`may`]`(1, 9)`
pub async fn seeded_store() -> (Arc<MemoryStore>, ImportReport) {
    let store = Arc::new(MemoryStore::new());
    let parser = MarkdownProjectParser::new();
    let report = import_outline(&*store, &parser, SAMPLE_OUTLINE, None, may(1, 9))
        .await
        .unwrap();
    (store, report)
}

/// Tasks of a project by title
pub async fn task_named(store: &MemoryStore, project: ProjectId, title: &str) -> Task {
    load_tree(store, project)
        .await
        .unwrap()
        .tasks
        .into_iter()
        .find(|t| t.title == title)
        .unwrap_or_else(|| panic!("no task named {title}"))
}
