//! Entity model for the profile aggregate
//!
//! A `Profile` is the aggregate root. It owns exactly one specialization
//! (individual or business, sharing the profile's id), any number of
//! documents and an append-style verification history.

mod api_key;
mod document;
mod enums;
mod patch;
mod profile;
mod verification;

pub use api_key::{ApiClient, ApiKey, CreateApiKeyRequest, NewApiKey};
pub use document::{NewDocument, ProfileDocument};
pub use enums::{DocumentType, Gender, ProfileType, VerificationStatus};
pub use patch::Patch;
pub use profile::{
    BusinessChanges, BusinessProfile, ContactChanges, ContactInfo, IndividualChanges,
    IndividualProfile, NewBusiness, NewIndividual, NewProfile, NewSpecialization, Profile,
    ProfileChanges, ProfileDetails, Specialization, SpecializationChanges,
};
pub use verification::{NewVerification, ProfileVerification, VerificationReview};
