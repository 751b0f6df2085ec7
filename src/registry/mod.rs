//! Specimen registry.
//!
//! Maps an integer specimen id (or a source name carrying it) to the immutable
//! physical record of that pellet. The table is plain data handed to the
//! registry at construction: either the built-in table or one loaded from JSON.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{DisplayColor, SpecimenRecord};
use crate::error::{KineticsError, KineticsResult};

/// Character positions (0-based, inclusive) of the id inside a source name.
pub const SOURCE_ID_START: usize = 12;
pub const SOURCE_ID_END: usize = 13;

/// Immutable lookup table of specimens keyed by id.
#[derive(Debug, Clone)]
pub struct SpecimenRegistry {
    specimens: BTreeMap<u32, SpecimenRecord>,
}

impl SpecimenRegistry {
    /// Build a registry from a list of records, rejecting duplicates and
    /// physically meaningless values.
    pub fn new(records: Vec<SpecimenRecord>) -> KineticsResult<Self> {
        let mut specimens = BTreeMap::new();
        for record in records {
            validate_record(&record)?;
            let id = record.id;
            if specimens.insert(id, record).is_some() {
                return Err(KineticsError::Config(format!("duplicate specimen id {id} in specimen table")));
            }
        }
        Ok(Self { specimens })
    }

    /// The registry over the built-in specimen table.
    pub fn builtin() -> Self {
        let specimens = builtin_table().into_iter().map(|r| (r.id, r)).collect();
        Self { specimens }
    }

    /// Load a specimen table from a JSON array of entries.
    pub fn from_json_path(path: &Path) -> KineticsResult<Self> {
        let file = File::open(path).map_err(|e| KineticsError::io(path, e))?;
        let entries: Vec<SpecimenEntry> = serde_json::from_reader(file).map_err(|e| {
            KineticsError::Config(format!("invalid specimen table '{}': {e}", path.display()))
        })?;
        Self::new(entries.into_iter().map(SpecimenEntry::into_record).collect())
    }

    pub fn lookup(&self, specimen_id: u32) -> KineticsResult<&SpecimenRecord> {
        self.specimens
            .get(&specimen_id)
            .ok_or(KineticsError::UnknownSpecimen { id: specimen_id })
    }

    pub fn lookup_by_source_name(&self, name: &str) -> KineticsResult<&SpecimenRecord> {
        let id = parse_source_id(name)?;
        self.lookup(id)
    }

    /// Records in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &SpecimenRecord> {
        self.specimens.values()
    }

    pub fn len(&self) -> usize {
        self.specimens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specimens.is_empty()
    }
}

/// Read the specimen id from characters 12..=13 of a source name.
pub fn parse_source_id(name: &str) -> KineticsResult<u32> {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= SOURCE_ID_END {
        return Err(KineticsError::InvalidSourceName {
            name: name.to_string(),
            reason: format!(
                "name has {} characters, the id is expected at positions {SOURCE_ID_START}-{SOURCE_ID_END}",
                chars.len()
            ),
        });
    }

    let raw: String = chars[SOURCE_ID_START..=SOURCE_ID_END].iter().collect();
    raw.trim().parse::<u32>().map_err(|_| KineticsError::InvalidSourceName {
        name: name.to_string(),
        reason: format!("'{raw}' at positions {SOURCE_ID_START}-{SOURCE_ID_END} is not a number"),
    })
}

/// One entry of a JSON specimen table.
#[derive(Debug, Clone, Deserialize)]
struct SpecimenEntry {
    id: u32,
    initial_mass: f64,
    start_time_s: usize,
    color: DisplayColor,
    label: String,
    #[serde(default = "default_correction")]
    reduction_correction_factor: f64,
    initial_radius: f64,
    #[serde(default)]
    provisional: bool,
}

fn default_correction() -> f64 {
    1.0
}

impl SpecimenEntry {
    fn into_record(self) -> SpecimenRecord {
        SpecimenRecord {
            id: self.id,
            initial_mass: self.initial_mass,
            start_time_s: self.start_time_s,
            reduction_correction_factor: self.reduction_correction_factor,
            initial_radius: self.initial_radius,
            display_color: self.color,
            display_label: self.label,
            provisional: self.provisional,
        }
    }
}

fn validate_record(record: &SpecimenRecord) -> KineticsResult<()> {
    let id = record.id;
    if !(record.initial_mass.is_finite() && record.initial_mass > 0.0) {
        return Err(KineticsError::Config(format!("specimen {id}: initial mass must be finite and > 0")));
    }
    if !(record.initial_radius.is_finite() && record.initial_radius > 0.0) {
        return Err(KineticsError::Config(format!("specimen {id}: initial radius must be finite and > 0")));
    }
    if !record.reduction_correction_factor.is_finite() {
        return Err(KineticsError::Config(format!("specimen {id}: correction factor must be finite")));
    }
    Ok(())
}

fn specimen(
    id: u32,
    initial_mass: f64,
    start_time_s: usize,
    display_color: DisplayColor,
    diameter_mm: f64,
    provisional: bool,
) -> SpecimenRecord {
    SpecimenRecord {
        id,
        initial_mass,
        start_time_s,
        reduction_correction_factor: 1.0,
        initial_radius: diameter_mm / 2.0 / 1000.0,
        display_color,
        display_label: format!("D={diameter_mm:.1}mm"),
        provisional,
    }
}

/// Built-in specimens of the reduction campaign.
///
/// Pellets 1, 5, 9 and 10 carry measured masses and onsets. The twin pellets
/// 2, 6 and 11 are provisional until their balance records are transcribed.
pub fn builtin_table() -> Vec<SpecimenRecord> {
    vec![
        specimen(1, 9.695, 4670, DisplayColor::Blue, 17.1, false),
        specimen(2, 9.512, 4610, DisplayColor::Orange, 17.0, true),
        specimen(5, 5.423, 4550, DisplayColor::Red, 13.9, false),
        specimen(6, 5.287, 4600, DisplayColor::Brown, 13.7, true),
        specimen(9, 1.6551, 4580, DisplayColor::Green, 9.5, false),
        specimen(10, 1.9795, 4660, DisplayColor::Purple, 9.8, false),
        specimen(11, 1.7204, 4640, DisplayColor::Pink, 9.6, true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_table_has_seven_specimens() {
        let reg = SpecimenRegistry::builtin();
        assert_eq!(reg.len(), 7);
        let ids: Vec<u32> = reg.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 5, 6, 9, 10, 11]);
    }

    #[test]
    fn lookup_returns_record() {
        let reg = SpecimenRegistry::builtin();
        let p1 = reg.lookup(1).unwrap();
        assert_eq!(p1.initial_mass, 9.695);
        assert_eq!(p1.start_time_s, 4670);
        assert_eq!(p1.display_label, "D=17.1mm");
        assert!((p1.initial_radius - 0.00855).abs() < 1e-12);
    }

    #[test]
    fn unknown_id_is_an_error_naming_the_id() {
        let reg = SpecimenRegistry::builtin();
        let err = reg.lookup(3).unwrap_err();
        assert!(matches!(err, KineticsError::UnknownSpecimen { id: 3 }));
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn source_name_id_is_read_at_fixed_offset() {
        assert_eq!(parse_source_id("pellet_test_01").unwrap(), 1);
        assert_eq!(parse_source_id("pellet_test_10_run2").unwrap(), 10);
        assert_eq!(parse_source_id("pellet_test_ 9").unwrap(), 9);

        let reg = SpecimenRegistry::builtin();
        assert_eq!(reg.lookup_by_source_name("pellet_test_05").unwrap().id, 5);
    }

    #[test]
    fn short_or_non_numeric_source_names_are_rejected() {
        let err = parse_source_id("short_01").unwrap_err();
        assert!(matches!(err, KineticsError::InvalidSourceName { .. }));

        let err = parse_source_id("pellet_test_xy").unwrap_err();
        assert!(matches!(err, KineticsError::InvalidSourceName { .. }));
        assert!(err.to_string().contains("xy"));
    }

    #[test]
    fn unknown_id_from_source_name_is_reported() {
        let reg = SpecimenRegistry::builtin();
        let err = reg.lookup_by_source_name("pellet_test_03").unwrap_err();
        assert!(matches!(err, KineticsError::UnknownSpecimen { id: 3 }));
    }

    #[test]
    fn json_table_round_trips_into_registry() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": 3, "initial_mass": 2.5, "start_time_s": 100, "color": "gray",
                  "label": "D=10.0mm", "initial_radius": 0.005}},
                {{"id": 4, "initial_mass": 3.0, "start_time_s": 0, "color": "black",
                  "label": "D=11.0mm", "reduction_correction_factor": 0.97, "initial_radius": 0.0055}}
            ]"#
        )
        .unwrap();

        let reg = SpecimenRegistry::from_json_path(file.path()).unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.lookup(3).unwrap().reduction_correction_factor, 1.0);
        assert_eq!(reg.lookup(4).unwrap().reduction_correction_factor, 0.97);
        assert_eq!(reg.lookup(4).unwrap().display_color, DisplayColor::Black);
        assert!(!reg.lookup(4).unwrap().provisional);
    }

    #[test]
    fn json_table_rejects_duplicates_and_bad_mass() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": 3, "initial_mass": 2.5, "start_time_s": 0, "color": "gray", "label": "a", "initial_radius": 0.005}},
                {{"id": 3, "initial_mass": 2.5, "start_time_s": 0, "color": "gray", "label": "b", "initial_radius": 0.005}}
            ]"#
        )
        .unwrap();
        let err = SpecimenRegistry::from_json_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate"));

        let bad = SpecimenRecord {
            initial_mass: 0.0,
            ..builtin_table()[0].clone()
        };
        assert!(SpecimenRegistry::new(vec![bad]).is_err());
    }

    #[test]
    fn non_positive_or_non_finite_radius_is_rejected() {
        for radius in [0.0, -0.004, f64::NAN, f64::INFINITY] {
            let bad = SpecimenRecord {
                initial_radius: radius,
                ..builtin_table()[0].clone()
            };
            let err = SpecimenRegistry::new(vec![bad]).unwrap_err();
            assert!(matches!(err, KineticsError::Config(_)), "radius {radius}");
            assert!(err.to_string().contains("radius"));
        }
    }

    #[test]
    fn only_measured_builtin_specimens_are_not_provisional() {
        let reg = SpecimenRegistry::builtin();
        let provisional: Vec<u32> = reg.iter().filter(|r| r.provisional).map(|r| r.id).collect();
        assert_eq!(provisional, vec![2, 6, 11]);
    }
}
