use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{Gender, Patch, ProfileDocument, ProfileType, ProfileVerification};

/// Base profile row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    /// Reference to the user in the identity system; unique
    pub external_user_id: Uuid,
    pub profile_type: ProfileType,
    pub phone_number: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Specialization row for individuals; `id` equals the profile id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct IndividualProfile {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub national_id_number: Option<String>,
}

/// Specialization row for businesses; `id` equals the profile id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BusinessProfile {
    pub id: Uuid,
    pub business_name: String,
    pub registration_number: Option<String>,
    pub tax_id: Option<String>,
    pub legal_representative_name: Option<String>,
}

/// The kind-specific half of a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Specialization {
    Individual(IndividualProfile),
    Business(BusinessProfile),
}

impl Specialization {
    pub fn kind(&self) -> ProfileType {
        match self {
            Specialization::Individual(_) => ProfileType::Individual,
            Specialization::Business(_) => ProfileType::Business,
        }
    }

    pub fn profile_id(&self) -> Uuid {
        match self {
            Specialization::Individual(ind) => ind.id,
            Specialization::Business(bus) => bus.id,
        }
    }
}

/// A profile with its whole ownership graph loaded.
///
/// `specialization` is optional only because storage can be inconsistent;
/// read-model assembly treats a missing or mismatched one as fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDetails {
    pub profile: Profile,
    pub specialization: Option<Specialization>,
    pub documents: Vec<ProfileDocument>,
    /// Newest first
    pub verifications: Vec<ProfileVerification>,
}

impl ProfileDetails {
    pub fn id(&self) -> Uuid {
        self.profile.id
    }

    /// Current status is always derived from the newest history record.
    pub fn latest_verification(&self) -> Option<&ProfileVerification> {
        self.verifications.iter().max_by_key(|v| v.created_at)
    }
}

// ============================================================================
// Creation inputs
// ============================================================================

/// Contact fields shared by both profile kinds
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct ContactInfo {
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct NewIndividual {
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    #[validate(length(max = 50))]
    pub national_id_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct NewBusiness {
    #[validate(length(max = 255))]
    pub business_name: String,
    #[validate(length(max = 100))]
    pub registration_number: Option<String>,
    #[validate(length(max = 100))]
    pub tax_id: Option<String>,
    #[validate(length(max = 200))]
    pub legal_representative_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NewSpecialization {
    Individual(NewIndividual),
    Business(NewBusiness),
}

impl NewSpecialization {
    pub fn kind(&self) -> ProfileType {
        match self {
            NewSpecialization::Individual(_) => ProfileType::Individual,
            NewSpecialization::Business(_) => ProfileType::Business,
        }
    }

    /// Build the specialization row that shares the profile's id.
    pub fn into_record(self, profile_id: Uuid) -> Specialization {
        match self {
            NewSpecialization::Individual(ind) => Specialization::Individual(IndividualProfile {
                id: profile_id,
                first_name: ind.first_name,
                last_name: ind.last_name,
                date_of_birth: ind.date_of_birth,
                gender: ind.gender,
                national_id_number: ind.national_id_number,
            }),
            NewSpecialization::Business(bus) => Specialization::Business(BusinessProfile {
                id: profile_id,
                business_name: bus.business_name,
                registration_number: bus.registration_number,
                tax_id: bus.tax_id,
                legal_representative_name: bus.legal_representative_name,
            }),
        }
    }
}

/// Everything needed to create a profile, its specialization and the
/// initial PENDING verification as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    pub external_user_id: Uuid,
    pub contact: ContactInfo,
    pub specialization: NewSpecialization,
}

impl NewProfile {
    pub fn kind(&self) -> ProfileType {
        self.specialization.kind()
    }
}

// ============================================================================
// Sparse updates
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactChanges {
    pub phone_number: Patch<String>,
    pub country: Patch<String>,
    pub city: Patch<String>,
    pub address: Patch<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndividualChanges {
    pub first_name: Patch<String>,
    pub last_name: Patch<String>,
    pub date_of_birth: Patch<NaiveDate>,
    pub gender: Patch<Gender>,
    pub national_id_number: Patch<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessChanges {
    pub business_name: Patch<String>,
    pub registration_number: Patch<String>,
    pub tax_id: Patch<String>,
    pub legal_representative_name: Patch<String>,
}

impl ContactChanges {
    /// Values being set, in a shape the length rules can run on.
    pub fn provided(&self) -> ContactInfo {
        ContactInfo {
            phone_number: self.phone_number.as_set().cloned(),
            country: self.country.as_set().cloned(),
            city: self.city.as_set().cloned(),
            address: self.address.as_set().cloned(),
        }
    }
}

impl IndividualChanges {
    pub fn provided(&self) -> NewIndividual {
        NewIndividual {
            first_name: self.first_name.as_set().cloned(),
            last_name: self.last_name.as_set().cloned(),
            date_of_birth: self.date_of_birth.as_set().copied(),
            gender: self.gender.as_set().copied(),
            national_id_number: self.national_id_number.as_set().cloned(),
        }
    }
}

impl BusinessChanges {
    pub fn provided(&self) -> NewBusiness {
        NewBusiness {
            business_name: self.business_name.as_set().cloned().unwrap_or_default(),
            registration_number: self.registration_number.as_set().cloned(),
            tax_id: self.tax_id.as_set().cloned(),
            legal_representative_name: self.legal_representative_name.as_set().cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpecializationChanges {
    Individual(IndividualChanges),
    Business(BusinessChanges),
}

/// Sparse update of a profile of a given kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileChanges {
    pub contact: ContactChanges,
    pub specialization: SpecializationChanges,
}

impl ProfileChanges {
    pub fn individual(contact: ContactChanges, changes: IndividualChanges) -> Self {
        Self {
            contact,
            specialization: SpecializationChanges::Individual(changes),
        }
    }

    pub fn business(contact: ContactChanges, changes: BusinessChanges) -> Self {
        Self {
            contact,
            specialization: SpecializationChanges::Business(changes),
        }
    }

    /// Kind of profile this update is allowed to touch
    pub fn kind(&self) -> ProfileType {
        match self.specialization {
            SpecializationChanges::Individual(_) => ProfileType::Individual,
            SpecializationChanges::Business(_) => ProfileType::Business,
        }
    }

    /// Apply onto loaded rows. Returns `false` and leaves everything untouched
    /// when the rows do not belong to the kind this update targets.
    pub fn apply(
        &self,
        profile: &mut Profile,
        specialization: &mut Specialization,
        now: DateTime<Utc>,
    ) -> bool {
        if profile.profile_type != self.kind() {
            return false;
        }

        match (&self.specialization, specialization) {
            (SpecializationChanges::Individual(changes), Specialization::Individual(ind)) => {
                changes.first_name.apply(&mut ind.first_name);
                changes.last_name.apply(&mut ind.last_name);
                changes.date_of_birth.apply(&mut ind.date_of_birth);
                changes.gender.apply(&mut ind.gender);
                changes.national_id_number.apply(&mut ind.national_id_number);
            }
            (SpecializationChanges::Business(changes), Specialization::Business(bus)) => {
                changes.business_name.apply_required(&mut bus.business_name);
                changes.registration_number.apply(&mut bus.registration_number);
                changes.tax_id.apply(&mut bus.tax_id);
                changes
                    .legal_representative_name
                    .apply(&mut bus.legal_representative_name);
            }
            _ => return false,
        }

        self.contact.phone_number.apply(&mut profile.phone_number);
        self.contact.country.apply(&mut profile.country);
        self.contact.city.apply(&mut profile.city);
        self.contact.address.apply(&mut profile.address);
        profile.updated_at = now;

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn individual_rows() -> (Profile, Specialization) {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let profile = Profile {
            id,
            external_user_id: Uuid::new_v4(),
            profile_type: ProfileType::Individual,
            phone_number: Some("+33 6 12 34 56 78".to_string()),
            country: Some("France".to_string()),
            city: Some("Lyon".to_string()),
            address: None,
            created_at: now,
            updated_at: now,
        };
        let record = NewSpecialization::Individual(NewIndividual {
            first_name: Some("Ana".to_string()),
            last_name: Some("Li".to_string()),
            ..Default::default()
        })
        .into_record(id);
        (profile, record)
    }

    #[test]
    fn test_into_record_shares_profile_id() {
        let id = Uuid::new_v4();
        let record = NewSpecialization::Business(NewBusiness {
            business_name: "Acme".to_string(),
            ..Default::default()
        })
        .into_record(id);

        assert_eq!(record.profile_id(), id);
        assert_eq!(record.kind(), ProfileType::Business);
    }

    #[test]
    fn test_apply_only_touches_provided_fields() {
        let (mut profile, mut record) = individual_rows();
        let later = profile.updated_at + chrono::Duration::seconds(5);

        let changes = ProfileChanges::individual(
            ContactChanges {
                city: Patch::Set("Paris".to_string()),
                phone_number: Patch::Clear,
                ..Default::default()
            },
            IndividualChanges {
                last_name: Patch::Set("Lee".to_string()),
                ..Default::default()
            },
        );

        assert!(changes.apply(&mut profile, &mut record, later));
        assert_eq!(profile.city.as_deref(), Some("Paris"));
        assert_eq!(profile.country.as_deref(), Some("France"));
        assert_eq!(profile.phone_number, None);
        assert_eq!(profile.updated_at, later);

        match record {
            Specialization::Individual(ind) => {
                assert_eq!(ind.first_name.as_deref(), Some("Ana"));
                assert_eq!(ind.last_name.as_deref(), Some("Lee"));
            }
            other => panic!("unexpected specialization: {:?}", other),
        }
    }

    #[test]
    fn test_apply_rejects_wrong_kind() {
        let (mut profile, mut record) = individual_rows();
        let before = (profile.clone(), record.clone());

        let changes = ProfileChanges::business(
            ContactChanges {
                city: Patch::Set("Paris".to_string()),
                ..Default::default()
            },
            BusinessChanges::default(),
        );

        assert!(!changes.apply(&mut profile, &mut record, Utc::now()));
        assert_eq!((profile, record), before);
    }
}
