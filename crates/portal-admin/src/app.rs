//! Wiring of store, mailer and services for one admin session

use crate::config::PortalConfig;
use anyhow::Context;
use portal_import::MarkdownProjectParser;
use portal_notify::{HttpMailer, LogMailer, MailSettings, Mailer, Milestones, StatusUpdates};
use portal_store::{MemoryStore, PortalStore};
use std::sync::Arc;

/// Store, mailer and settings shared by every command
#[derive(Clone)]
pub struct Portal {
    store: Arc<dyn PortalStore>,
    mailer: Arc<dyn Mailer>,
    settings: MailSettings,
    parser: MarkdownProjectParser,
}

impl Portal {
    /// Assemble from parts
    #[must_use]
    pub fn new(
        store: Arc<dyn PortalStore>,
        mailer: Arc<dyn Mailer>,
        settings: MailSettings,
    ) -> Self {
        Self {
            store,
            mailer,
            settings,
            parser: MarkdownProjectParser::new(),
        }
    }

    /// With outline parser
    #[inline]
    #[must_use]
    pub fn with_parser(mut self, parser: MarkdownProjectParser) -> Self {
        self.parser = parser;
        self
    }

    /// Open the configured store and pick the mailer
    ///
    /// # Errors
    /// When the store document cannot be read or the mailer is misconfigured.
    pub async fn open(config: &PortalConfig) -> anyhow::Result<Self> {
        let store = MemoryStore::open(&config.store.path)
            .await
            .with_context(|| format!("failed to open store {}", config.store.path.display()))?;

        let mailer: Arc<dyn Mailer> = match (&config.mail.api_key, config.mail.dry_run) {
            (Some(key), false) => {
                tracing::info!(endpoint = %config.mail.api_url, "sending mail through api");
                let mailer = HttpMailer::new(&config.mail.api_url, key)
                    .context("failed to set up mailer")?;
                Arc::new(mailer)
            }
            _ => {
                tracing::info!("mail dry run, messages are only logged");
                Arc::new(LogMailer)
            }
        };

        let parser = MarkdownProjectParser::new()
            .with_placeholder(&config.import.placeholder_description);
        Ok(Self::new(Arc::new(store), mailer, config.mail_settings()).with_parser(parser))
    }

    /// Backing store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &dyn PortalStore {
        &*self.store
    }

    /// Outline parser
    #[inline]
    #[must_use]
    pub fn parser(&self) -> &MarkdownProjectParser {
        &self.parser
    }

    /// Mailer in use
    #[inline]
    #[must_use]
    pub fn mailer(&self) -> &dyn Mailer {
        &*self.mailer
    }

    /// Sender settings
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &MailSettings {
        &self.settings
    }

    /// Status update service
    #[must_use]
    pub fn updates(&self) -> StatusUpdates<dyn PortalStore, dyn Mailer> {
        StatusUpdates::new(self.store.clone(), self.mailer.clone(), self.settings.clone())
    }

    /// Milestone service
    #[must_use]
    pub fn milestones(&self) -> Milestones<dyn PortalStore, dyn Mailer> {
        Milestones::new(self.store.clone(), self.mailer.clone(), self.settings.clone())
    }
}
