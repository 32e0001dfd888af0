//! Milestone updates
//!
//! Admins move a project's discovery, proposal and invoice milestones
//! forward. Every saved change is mailed to the project's client. The change
//! is already persisted by then, so a failed notice is logged and dropped.

use crate::error::MilestoneError;
use crate::mailer::{MailSettings, Mailer};
use crate::render::render_milestone_notice;
use chrono::{DateTime, Utc};
use portal_model::{Milestone, MilestoneRecord, MilestoneUpdate, ProjectId};
use portal_store::PortalStore;
use std::sync::Arc;

/// Outcome of a milestone update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneChange {
    /// Saved milestone
    pub record: MilestoneRecord,
    /// Whether the client notice was delivered
    pub notified: bool,
}

/// Applies milestone updates and notifies the client
pub struct Milestones<S: ?Sized, M: ?Sized> {
    store: Arc<S>,
    mailer: Arc<M>,
    settings: MailSettings,
}

impl<S, M> Milestones<S, M>
where
    S: PortalStore + ?Sized,
    M: Mailer + ?Sized,
{
    /// Create service
    #[must_use]
    pub fn new(store: Arc<S>, mailer: Arc<M>, settings: MailSettings) -> Self {
        Self {
            store,
            mailer,
            settings,
        }
    }

    /// Apply `update` to the project's milestone of the same kind
    ///
    /// # Errors
    /// See [`Self::update_at`].
    pub async fn update(
        &self,
        project_id: ProjectId,
        update: MilestoneUpdate,
    ) -> Result<MilestoneChange, MilestoneError> {
        self.update_at(project_id, update, Utc::now()).await
    }

    /// Apply `update`, stamping the record with `now`
    ///
    /// A milestone that was never set starts from its default state.
    ///
    /// # Errors
    /// - `MilestoneError::Store` if the project is missing or a write fails
    /// - `MilestoneError::Update` if the stored milestone has another kind
    #[tracing::instrument(skip(self, update), fields(project = %project_id, kind = %update.kind()))]
    pub async fn update_at(
        &self,
        project_id: ProjectId,
        update: MilestoneUpdate,
        now: DateTime<Utc>,
    ) -> Result<MilestoneChange, MilestoneError> {
        let project = self.store.project(project_id).await?;
        let kind = update.kind();

        let mut milestone = self
            .store
            .milestone(project_id, kind)
            .await?
            .map_or_else(|| Milestone::initial(kind), |r| r.milestone);
        milestone.apply(update)?;

        let record = MilestoneRecord {
            project_id,
            milestone,
            updated_at: now,
        };
        self.store.save_milestone(&record).await?;
        tracing::info!(status = record.milestone.status_label(), "milestone saved");

        let Some(client_id) = project.client else {
            tracing::debug!("project has no client, notice skipped");
            return Ok(MilestoneChange {
                record,
                notified: false,
            });
        };

        let notified = match self.store.user(client_id).await {
            Ok(client) => {
                let email = render_milestone_notice(&project, &record, &client, &self.settings)
                    .into_outgoing(&self.settings, client.email.clone());
                match self.mailer.send(&email).await {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            to = %client.email,
                            "milestone notice not delivered"
                        );
                        false
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, client = %client_id, "milestone notice skipped");
                false
            }
        };

        Ok(MilestoneChange { record, notified })
    }

    /// Current milestones of a project, in workflow order
    ///
    /// # Errors
    /// `MilestoneError::Store` if the read fails.
    pub async fn list(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<MilestoneRecord>, MilestoneError> {
        let mut records = self.store.milestones(project_id).await?;
        records.sort_by_key(|r| r.milestone.kind());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MailError;
    use crate::mailer::{DeliveryReceipt, MockMailer};
    use portal_model::{
        DiscoveryStatus, DiscoveryUpdate, InvoiceStatus, InvoiceUpdate, MilestoneKind, Project,
        UserProfile,
    };
    use portal_store::MemoryStore;
    use pretty_assertions::assert_eq;

    async fn project_with_client(store: &MemoryStore) -> Project {
        let client = UserProfile::client("ana@client.example", "Ana", Utc::now());
        store.insert_user(&client).await.unwrap();
        let project = Project::new("Pantry", "Lists", Utc::now()).with_client(client.id);
        store.insert_project(&project).await.unwrap();
        project
    }

    fn invoice_paid() -> MilestoneUpdate {
        MilestoneUpdate::Invoice(InvoiceUpdate {
            status: Some(InvoiceStatus::Paid),
            amount_cents: Some(120_000),
            ..InvoiceUpdate::default()
        })
    }

    #[tokio::test]
    async fn first_update_starts_from_default_and_notifies() {
        let store = Arc::new(MemoryStore::new());
        let project = project_with_client(&store).await;
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|email| {
                email.to == "ana@client.example" && email.subject == "Pantry: Invoice paid"
            })
            .times(1)
            .returning(|_| Ok(DeliveryReceipt::default()));
        let milestones = Milestones::new(store.clone(), Arc::new(mailer), MailSettings::default());

        let change = milestones.update(project.id, invoice_paid()).await.unwrap();

        assert!(change.notified);
        assert_eq!(change.record.milestone.describe(), "Invoice: Paid (1200.00)");
        assert_eq!(
            store.milestone(project.id, MilestoneKind::Invoice).await.unwrap(),
            Some(change.record)
        );
    }

    #[tokio::test]
    async fn mail_failure_is_swallowed() {
        let store = Arc::new(MemoryStore::new());
        let project = project_with_client(&store).await;
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(1)
            .returning(|_| Err(MailError::rejected(503, "unavailable")));
        let milestones = Milestones::new(store.clone(), Arc::new(mailer), MailSettings::default());

        let change = milestones
            .update(
                project.id,
                MilestoneUpdate::Discovery(DiscoveryUpdate {
                    status: Some(DiscoveryStatus::Scheduled),
                    ..DiscoveryUpdate::default()
                }),
            )
            .await
            .unwrap();

        assert!(!change.notified);
        assert_eq!(milestones.list(project.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn project_without_client_is_not_mailed() {
        let store = Arc::new(MemoryStore::new());
        let project = Project::new("Internal", "", Utc::now());
        store.insert_project(&project).await.unwrap();
        let mut mailer = MockMailer::new();
        mailer.expect_send().never();
        let milestones = Milestones::new(store, Arc::new(mailer), MailSettings::default());

        let change = milestones.update(project.id, invoice_paid()).await.unwrap();
        assert!(!change.notified);
    }

    #[tokio::test]
    async fn later_update_keeps_earlier_fields() {
        let store = Arc::new(MemoryStore::new());
        let project = project_with_client(&store).await;
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(3)
            .returning(|_| Ok(DeliveryReceipt::default()));
        let milestones = Milestones::new(store, Arc::new(mailer), MailSettings::default());

        milestones.update(project.id, invoice_paid()).await.unwrap();
        milestones
            .update(
                project.id,
                MilestoneUpdate::Invoice(InvoiceUpdate {
                    invoice_url: Some("https://pay.example/inv/1".into()),
                    ..InvoiceUpdate::default()
                }),
            )
            .await
            .unwrap();
        milestones
            .update(
                project.id,
                MilestoneUpdate::Discovery(DiscoveryUpdate {
                    status: Some(DiscoveryStatus::Completed),
                    ..DiscoveryUpdate::default()
                }),
            )
            .await
            .unwrap();

        let kinds: Vec<_> = milestones
            .list(project.id)
            .await
            .unwrap()
            .iter()
            .map(|r| r.milestone.kind())
            .collect();
        assert_eq!(kinds, vec![MilestoneKind::Discovery, MilestoneKind::Invoice]);

        let invoice = milestones.list(project.id).await.unwrap().pop().unwrap();
        assert_eq!(invoice.milestone.describe(), "Invoice: Paid (1200.00)");
        match invoice.milestone {
            Milestone::Invoice(m) => {
                assert_eq!(m.invoice_url.as_deref(), Some("https://pay.example/inv/1"));
            }
            other => panic!("unexpected milestone {other:?}"),
        }
    }
}
