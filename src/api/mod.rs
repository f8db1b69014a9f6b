pub mod client;

use async_trait::async_trait;

use crate::errors::ApiError;
use crate::models::{
    AppointmentEdit, AppointmentReply, AppointmentRequest, AppointmentStatus,
    AppointmentSubmission, AvailabilityFeed, AvailabilityQuery, CenterCatalog, SubmitReply,
};

pub use client::DoctolibClient;

// The booking endpoints the search-and-book engine consumes, one typed
// method per endpoint. Login and account endpoints live on the concrete
// client.
#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn center_catalog(&self, center: &str) -> Result<CenterCatalog, ApiError>;

    async fn availabilities(&self, query: &AvailabilityQuery)
        -> Result<AvailabilityFeed, ApiError>;

    async fn create_appointment(
        &self,
        request: &AppointmentRequest,
    ) -> Result<AppointmentReply, ApiError>;

    async fn appointment_edit(
        &self,
        appointment_id: &str,
        master_patient_id: Option<u64>,
    ) -> Result<AppointmentEdit, ApiError>;

    async fn submit_appointment(
        &self,
        appointment_id: &str,
        submission: &AppointmentSubmission,
    ) -> Result<SubmitReply, ApiError>;

    async fn appointment_status(&self, appointment_id: &str)
        -> Result<AppointmentStatus, ApiError>;
}
