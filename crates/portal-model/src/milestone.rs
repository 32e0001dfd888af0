//! Admin-tracked project milestones
//!
//! A project moves through three phases: a discovery call, a proposal and an
//! invoice. Each phase has its own status enum and its own fields, so the
//! milestone is a closed tagged union and every update is matched
//! exhaustively against it. An update can only touch fields that exist for
//! its kind.

use crate::error::{MilestoneUpdateError, UnknownVariant};
use crate::ids::ProjectId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! wire_enum {
    (
        $name:ident,
        $what:literal,
        { $($variant:ident => $wire:literal / $label:literal),+ $(,)? }
    ) => {
        impl $name {
            /// All variants in workflow order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire name
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Human readable label
            #[must_use]
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| UnknownVariant::new($what, s))
            }
        }
    };
}

/// Milestone discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    /// Discovery call
    Discovery,
    /// Written proposal
    Proposal,
    /// Invoice
    Invoice,
}

wire_enum!(MilestoneKind, "milestone kind", {
    Discovery => "discovery" / "Discovery call",
    Proposal => "proposal" / "Proposal",
    Invoice => "invoice" / "Invoice",
});

/// Discovery call status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStatus {
    /// No call booked
    #[default]
    NotScheduled,
    /// Call booked
    Scheduled,
    /// Call held
    Completed,
}

wire_enum!(DiscoveryStatus, "discovery status", {
    NotScheduled => "not_scheduled" / "Not scheduled",
    Scheduled => "scheduled" / "Scheduled",
    Completed => "completed" / "Completed",
});

/// Proposal status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Being written
    #[default]
    Draft,
    /// Sent to the client
    Sent,
    /// Client accepted
    Accepted,
    /// Client declined
    Declined,
}

wire_enum!(ProposalStatus, "proposal status", {
    Draft => "draft" / "Draft",
    Sent => "sent" / "Sent",
    Accepted => "accepted" / "Accepted",
    Declined => "declined" / "Declined",
});

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Not yet issued
    #[default]
    Draft,
    /// Issued to the client
    Sent,
    /// Payment received
    Paid,
    /// Past its due date
    Overdue,
}

wire_enum!(InvoiceStatus, "invoice status", {
    Draft => "draft" / "Draft",
    Sent => "sent" / "Sent",
    Paid => "paid" / "Paid",
    Overdue => "overdue" / "Overdue",
});

/// Discovery call milestone
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Discovery {
    /// Call progress
    pub status: DiscoveryStatus,
    /// Scheduled call time
    pub call_at: Option<DateTime<Utc>>,
    /// Notes from the call
    pub notes: Option<String>,
}

/// Proposal milestone
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposal progress
    pub status: ProposalStatus,
    /// Link to the proposal document
    pub document_url: Option<String>,
}

/// Invoice milestone
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Invoice {
    /// Payment progress
    pub status: InvoiceStatus,
    /// Amount in the smallest currency unit
    pub amount_cents: u64,
    /// Payment due date
    pub due_on: Option<NaiveDate>,
    /// Link to the hosted invoice
    pub invoice_url: Option<String>,
}

/// One project milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Milestone {
    /// Discovery call
    Discovery(Discovery),
    /// Proposal sent to the client
    Proposal(Proposal),
    /// Invoice for the project
    Invoice(Invoice),
}

impl Milestone {
    /// Fresh milestone of `kind` with every field at its default
    #[must_use]
    pub fn initial(kind: MilestoneKind) -> Self {
        match kind {
            MilestoneKind::Discovery => Milestone::Discovery(Discovery::default()),
            MilestoneKind::Proposal => Milestone::Proposal(Proposal::default()),
            MilestoneKind::Invoice => Milestone::Invoice(Invoice::default()),
        }
    }

    /// Discriminant
    #[must_use]
    pub fn kind(&self) -> MilestoneKind {
        match self {
            Milestone::Discovery(_) => MilestoneKind::Discovery,
            Milestone::Proposal(_) => MilestoneKind::Proposal,
            Milestone::Invoice(_) => MilestoneKind::Invoice,
        }
    }

    /// Label of the current status
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        match self {
            Milestone::Discovery(m) => m.status.label(),
            Milestone::Proposal(m) => m.status.label(),
            Milestone::Invoice(m) => m.status.label(),
        }
    }

    /// Apply an update of the same kind
    ///
    /// # Errors
    /// `KindMismatch` when the update targets another milestone kind. The
    /// milestone is left untouched in that case.
    pub fn apply(&mut self, update: MilestoneUpdate) -> Result<(), MilestoneUpdateError> {
        let mismatch = MilestoneUpdateError::KindMismatch {
            milestone: self.kind(),
            update: update.kind(),
        };
        match (self, update) {
            (Milestone::Discovery(m), MilestoneUpdate::Discovery(u)) => {
                if let Some(status) = u.status {
                    m.status = status;
                }
                if u.call_at.is_some() {
                    m.call_at = u.call_at;
                }
                if u.notes.is_some() {
                    m.notes = u.notes;
                }
                Ok(())
            }
            (Milestone::Proposal(m), MilestoneUpdate::Proposal(u)) => {
                if let Some(status) = u.status {
                    m.status = status;
                }
                if u.document_url.is_some() {
                    m.document_url = u.document_url;
                }
                Ok(())
            }
            (Milestone::Invoice(m), MilestoneUpdate::Invoice(u)) => {
                if let Some(status) = u.status {
                    m.status = status;
                }
                if let Some(amount) = u.amount_cents {
                    m.amount_cents = amount;
                }
                if u.due_on.is_some() {
                    m.due_on = u.due_on;
                }
                if u.invoice_url.is_some() {
                    m.invoice_url = u.invoice_url;
                }
                Ok(())
            }
            (
                Milestone::Discovery(_),
                MilestoneUpdate::Proposal(_) | MilestoneUpdate::Invoice(_),
            )
            | (
                Milestone::Proposal(_),
                MilestoneUpdate::Discovery(_) | MilestoneUpdate::Invoice(_),
            )
            | (
                Milestone::Invoice(_),
                MilestoneUpdate::Discovery(_) | MilestoneUpdate::Proposal(_),
            ) => Err(mismatch),
        }
    }

    /// One-line description for notifications
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Milestone::Discovery(m) => match m.call_at {
                Some(at) => format!(
                    "Discovery call: {} ({})",
                    m.status.label(),
                    at.format("%Y-%m-%d %H:%M UTC")
                ),
                None => format!("Discovery call: {}", m.status.label()),
            },
            Milestone::Proposal(m) => format!("Proposal: {}", m.status.label()),
            Milestone::Invoice(m) => {
                let amount = format!("{}.{:02}", m.amount_cents / 100, m.amount_cents % 100);
                match m.due_on {
                    Some(due) => format!("Invoice: {} ({amount}, due {due})", m.status.label()),
                    None => format!("Invoice: {} ({amount})", m.status.label()),
                }
            }
        }
    }
}

/// Fields an admin may change on a discovery milestone
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscoveryUpdate {
    /// New status
    pub status: Option<DiscoveryStatus>,
    /// New call time
    pub call_at: Option<DateTime<Utc>>,
    /// Replacement notes
    pub notes: Option<String>,
}

/// Fields an admin may change on a proposal milestone
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProposalUpdate {
    /// New status
    pub status: Option<ProposalStatus>,
    /// New document link
    pub document_url: Option<String>,
}

/// Fields an admin may change on an invoice milestone
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvoiceUpdate {
    /// New status
    pub status: Option<InvoiceStatus>,
    /// New amount in the smallest currency unit
    pub amount_cents: Option<u64>,
    /// New due date
    pub due_on: Option<NaiveDate>,
    /// New hosted invoice link
    pub invoice_url: Option<String>,
}

/// Update payload, one variant per milestone kind
///
/// `None` fields leave the stored value unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MilestoneUpdate {
    /// Change a discovery milestone
    Discovery(DiscoveryUpdate),
    /// Change a proposal milestone
    Proposal(ProposalUpdate),
    /// Change an invoice milestone
    Invoice(InvoiceUpdate),
}

impl MilestoneUpdate {
    /// Discriminant
    #[must_use]
    pub fn kind(&self) -> MilestoneKind {
        match self {
            MilestoneUpdate::Discovery(_) => MilestoneKind::Discovery,
            MilestoneUpdate::Proposal(_) => MilestoneKind::Proposal,
            MilestoneUpdate::Invoice(_) => MilestoneKind::Invoice,
        }
    }
}

/// Stored milestone row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRecord {
    /// Owning project
    pub project_id: ProjectId,
    /// Current state
    pub milestone: Milestone,
    /// Last change
    pub updated_at: DateTime<Utc>,
}
