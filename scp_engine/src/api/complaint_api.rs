use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Complaint, ComplaintStatus, NewComplaint},
    events::{ComplaintEscalatedEvent, EventProducers},
    traits::{ChatGatewayDatabase, ChatGatewayError},
};

/// Shortest acceptable resolution text, in characters.
pub const MIN_RESOLUTION_LENGTH: usize = 10;

/// `ComplaintApi` handles complaint filing, escalation to management and resolution.
pub struct ComplaintApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ComplaintApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ComplaintApi")
    }
}

impl<B> ComplaintApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ComplaintApi<B>
where B: ChatGatewayDatabase
{
    /// Files a new complaint. Complaints start out `open`.
    pub async fn create_complaint(&self, complaint: NewComplaint) -> Result<Complaint, ChatGatewayError> {
        let complaint = self.db.insert_complaint(complaint).await?;
        debug!("📣️ Complaint {} ({}) created", complaint.id, complaint.priority);
        Ok(complaint)
    }

    pub async fn fetch_complaint(&self, complaint_id: &str) -> Result<Option<Complaint>, ChatGatewayError> {
        self.db.fetch_complaint(complaint_id).await
    }

    pub async fn complaints_for_supplier(&self, supplier_id: &str) -> Result<Vec<Complaint>, ChatGatewayError> {
        self.db.complaints_for_supplier(supplier_id).await
    }

    /// Escalates the complaint to management on behalf of the acting staff member.
    ///
    /// The status change, the fixed escalation message in the linked conversation and the conversation's
    /// last-activity refresh commit atomically — either the escalation happened everywhere, or nowhere.
    pub async fn escalate_complaint(
        &self,
        complaint_id: &str,
        acting_staff_id: &str,
    ) -> Result<Complaint, ChatGatewayError> {
        let (complaint, message) = self.db.escalate_complaint(complaint_id, acting_staff_id).await?;
        debug!("📣️ Complaint {} escalated by {acting_staff_id}", complaint.id);
        self.call_complaint_escalated_hook(&complaint, &message).await;
        Ok(complaint)
    }

    /// Resolves the complaint. The resolution text must carry at least [`MIN_RESOLUTION_LENGTH`] characters.
    /// Reachable from `open` or `escalated`; resolving twice is rejected.
    pub async fn resolve_complaint(
        &self,
        complaint_id: &str,
        resolution: &str,
    ) -> Result<Complaint, ChatGatewayError> {
        let length = resolution.chars().count();
        if length < MIN_RESOLUTION_LENGTH {
            return Err(ChatGatewayError::ResolutionTooShort { minimum: MIN_RESOLUTION_LENGTH, actual: length });
        }
        let current = self
            .db
            .fetch_complaint(complaint_id)
            .await?
            .ok_or_else(|| ChatGatewayError::ComplaintNotFound(complaint_id.to_string()))?;
        if current.status == ComplaintStatus::Resolved {
            return Err(ChatGatewayError::ComplaintAlreadyResolved(complaint_id.to_string()));
        }
        let complaint = self.db.resolve_complaint(complaint_id, resolution).await?;
        debug!("📣️ Complaint {} resolved", complaint.id);
        Ok(complaint)
    }

    async fn call_complaint_escalated_hook(&self, complaint: &Complaint, message: &crate::db_types::Message) {
        for emitter in &self.producers.complaint_escalated_producer {
            trace!("📣️ Notifying complaint escalated hook subscribers");
            emitter.publish_event(ComplaintEscalatedEvent::new(complaint.clone(), message.clone())).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
