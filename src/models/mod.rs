pub mod appointment;
pub mod availability;
pub mod catalog;
pub mod patient;

pub use appointment::{
    AppointmentEdit, AppointmentReply, AppointmentRequest, AppointmentStatus,
    AppointmentSubmission, CustomField, SubmitReply,
};
pub use availability::{AvailabilityDay, AvailabilityFeed, AvailabilityQuery, Slot, SlotStep};
pub use catalog::{Agenda, CenterCatalog, Place, Profile, VisitMotive};
pub use patient::Patient;
