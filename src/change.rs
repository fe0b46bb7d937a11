//! Field edits
//!
//! Form events arrive as `name`/`value` pairs; they are resolved once into a
//! typed [`FieldChange`] and applied through explicit cases.

use crate::record::{CharacterRecord, NumericField, Quadrant, STRESS_BOXES, StressTrack, TextField};

/// Persisted key of the portrait field
pub const IMAGE_KEY: &str = "characterImage";

/// A single edit to the session record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    /// Free text, stored verbatim
    Text(TextField, String),
    /// Skill or meter value, clamped into range on apply
    Number(NumericField, i64),
    /// Flip one stress box
    StressToggle(Quadrant, usize),
    /// Replace a whole stress track
    Stress(Quadrant, StressTrack),
    /// Set or clear the portrait data URI
    Image(Option<String>),
}

impl FieldChange {
    /// Resolve a `name`/`value` form event. Numeric values are coerced from
    /// text, stress tracks are read as a JSON bool array. Unknown names and
    /// malformed stress tracks yield None.
    pub fn from_name_value(name: &str, raw: &str) -> Option<Self> {
        if let Some(field) = NumericField::from_key(name) {
            let value = crate::record::parse_int(raw)
                .unwrap_or_else(|| i64::from(field.default_value()));
            return Some(FieldChange::Number(field, value));
        }
        if let Some(field) = TextField::from_key(name) {
            return Some(FieldChange::Text(field, raw.to_string()));
        }
        if let Some(quadrant) = Quadrant::from_stress_key(name) {
            return serde_json::from_str::<StressTrack>(raw)
                .ok()
                .map(|track| FieldChange::Stress(quadrant, track));
        }
        if name == IMAGE_KEY {
            let image = (!raw.is_empty()).then(|| raw.to_string());
            return Some(FieldChange::Image(image));
        }
        None
    }

    /// Persisted key this change writes
    pub fn key(&self) -> &'static str {
        match self {
            FieldChange::Text(field, _) => field.key(),
            FieldChange::Number(field, _) => field.key(),
            FieldChange::StressToggle(q, _) | FieldChange::Stress(q, _) => q.stress_key(),
            FieldChange::Image(_) => IMAGE_KEY,
        }
    }

    /// Apply to a record. Returns false when the change was ignored
    /// (stress index past the last box).
    pub fn apply(self, record: &mut CharacterRecord) -> bool {
        match self {
            FieldChange::Text(field, value) => {
                *record.text_mut(field) = value;
            }
            FieldChange::Number(field, value) => {
                record.set_numeric(field, value);
            }
            FieldChange::StressToggle(quadrant, index) => {
                if index >= STRESS_BOXES {
                    log::warn!(
                        "Ignoring toggle of {} box {}",
                        quadrant.stress_key(),
                        index
                    );
                    return false;
                }
                let mut track = record.stress(quadrant);
                track[index] = !track[index];
                record.set_stress(quadrant, track);
            }
            FieldChange::Stress(quadrant, track) => {
                record.set_stress(quadrant, track);
            }
            FieldChange::Image(image) => {
                record.character_image = image;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Meter, default_record};

    #[test]
    fn test_toggle_flips_one_box() {
        let mut r = default_record();
        assert!(FieldChange::StressToggle(Quadrant::Heart, 1).apply(&mut r));
        assert_eq!(r.heart_stress, [false, true, false]);
        assert_eq!(r.soul_stress, [false; STRESS_BOXES]);
        assert_eq!(r.mind_stress, [false; STRESS_BOXES]);
        assert_eq!(r.strength_stress, [false; STRESS_BOXES]);

        FieldChange::StressToggle(Quadrant::Heart, 1).apply(&mut r);
        assert_eq!(r.heart_stress, [false; STRESS_BOXES]);
    }

    #[test]
    fn test_toggle_out_of_range_is_ignored() {
        let mut r = default_record();
        assert!(!FieldChange::StressToggle(Quadrant::Mind, 3).apply(&mut r));
        assert_eq!(r, default_record());
    }

    #[test]
    fn test_from_name_value_numeric() {
        assert_eq!(
            FieldChange::from_name_value("Heart", "3"),
            Some(FieldChange::Number(NumericField::Skill(Quadrant::Heart), 3))
        );
        assert_eq!(
            FieldChange::from_name_value("grace", "oops"),
            Some(FieldChange::Number(NumericField::Meter(Meter::Grace), 3))
        );
    }

    #[test]
    fn test_from_name_value_text_and_stress() {
        assert_eq!(
            FieldChange::from_name_value("verse", "Revelation 21:4"),
            Some(FieldChange::Text(TextField::Verse, "Revelation 21:4".into()))
        );
        assert_eq!(
            FieldChange::from_name_value("soulStress", "[true,false,true]"),
            Some(FieldChange::Stress(Quadrant::Soul, [true, false, true]))
        );
        assert_eq!(FieldChange::from_name_value("soulStress", "[true]"), None);
        assert_eq!(FieldChange::from_name_value("unknown", "1"), None);
    }

    #[test]
    fn test_from_name_value_image() {
        assert_eq!(
            FieldChange::from_name_value(IMAGE_KEY, ""),
            Some(FieldChange::Image(None))
        );
        let change = FieldChange::from_name_value(IMAGE_KEY, "data:image/png;base64,AAAA").unwrap();
        assert_eq!(change.key(), IMAGE_KEY);
    }

    #[test]
    fn test_number_is_clamped_on_apply() {
        let mut r = default_record();
        FieldChange::Number(NumericField::Meter(Meter::Fear), 12).apply(&mut r);
        assert_eq!(r.fear, 5);
    }
}
