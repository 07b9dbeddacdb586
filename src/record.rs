//! Dermatologist records and the fixed seed rows

use serde::{Deserialize, Serialize};

/// One row of the `dermatologists` table.
///
/// `status` is free text ("Active"/"Inactive" in practice) and
/// `specialties` is an unnormalized comma-separated list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DermatologistRecord {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub status: String,
    pub specialties: Option<String>,
}

impl DermatologistRecord {
    pub fn new(id: i64, name: &str, city: &str, status: &str, specialties: Option<&str>) -> Self {
        Self {
            id,
            name: name.to_string(),
            city: city.to_string(),
            status: status.to_string(),
            specialties: specialties.map(str::to_string),
        }
    }
}

/// Rows inserted when a database has to be synthesized from scratch
pub fn seed_records() -> Vec<DermatologistRecord> {
    vec![
        DermatologistRecord::new(1, "Dr. Alice Smith", "New York", "Active", Some("Acne, Eczema")),
        DermatologistRecord::new(2, "Dr. Bob Johnson", "Los Angeles", "Active", Some("Psoriasis, Skin Cancer")),
        DermatologistRecord::new(3, "Dr. Carol Williams", "Chicago", "Inactive", Some("Rosacea")),
        DermatologistRecord::new(4, "Dr. David Brown", "Houston", "Active", Some("Dermatitis, Allergies")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_ids_are_sequential() {
        let ids: Vec<i64> = seed_records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_only_carol_is_inactive() {
        let inactive: Vec<_> = seed_records().into_iter().filter(|r| r.status == "Inactive").collect();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].name, "Dr. Carol Williams");
    }

    #[test]
    fn test_new_keeps_missing_specialties_as_null() {
        let bare = DermatologistRecord::new(9, "Dr. X", "Nowhere", "Active", None);
        assert_eq!(bare.specialties, None);
        assert_eq!(seed_records()[1].specialties.as_deref(), Some("Psoriasis, Skin Cancer"));
    }
}
