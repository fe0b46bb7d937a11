//! Character record model
//!
//! The record is persisted as a flat JSON object (`characterName`, `Heart`,
//! `heartStress`, ...) so field names are pinned with serde renames. Numeric
//! fields are read leniently: older saves and form inputs hand them over as
//! text, and they are coerced back to integers on load.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::validation::SkillScores;

/// Boxes per stress tracker
pub const STRESS_BOXES: usize = 3;

/// Highest skill score a quadrant can hold
pub const SKILL_MAX: u8 = 3;

/// One quadrant's stress boxes, index 0 = first box
pub type StressTrack = [bool; STRESS_BOXES];

/// Keys of every field that is coerced to an integer
pub const NUMERIC_FIELD_NAMES: [&str; 7] =
    ["Heart", "Soul", "Mind", "Strength", "grace", "fear", "fury"];

/// Whether a persisted/DOM field name denotes a numeric field
pub fn is_numeric_field(name: &str) -> bool {
    NUMERIC_FIELD_NAMES.contains(&name)
}

/// The four core attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quadrant {
    Heart,
    Soul,
    Mind,
    Strength,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::Heart,
        Quadrant::Soul,
        Quadrant::Mind,
        Quadrant::Strength,
    ];

    /// Skill key, also the display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Quadrant::Heart => "Heart",
            Quadrant::Soul => "Soul",
            Quadrant::Mind => "Mind",
            Quadrant::Strength => "Strength",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "heart" => Some(Quadrant::Heart),
            "soul" => Some(Quadrant::Soul),
            "mind" => Some(Quadrant::Mind),
            "strength" => Some(Quadrant::Strength),
            _ => None,
        }
    }

    pub fn aspect_key(&self) -> &'static str {
        match self {
            Quadrant::Heart => "heartAspect",
            Quadrant::Soul => "soulAspect",
            Quadrant::Mind => "mindAspect",
            Quadrant::Strength => "strengthAspect",
        }
    }

    pub fn stress_key(&self) -> &'static str {
        match self {
            Quadrant::Heart => "heartStress",
            Quadrant::Soul => "soulStress",
            Quadrant::Mind => "mindStress",
            Quadrant::Strength => "strengthStress",
        }
    }

    /// Resolve a `heartStress`-style key
    pub fn from_stress_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.stress_key() == key)
    }
}

/// Bounded counters selected from a fixed range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Meter {
    Grace,
    Fear,
    Fury,
}

impl Meter {
    pub const ALL: [Meter; 3] = [Meter::Grace, Meter::Fear, Meter::Fury];

    /// Persisted key
    pub fn as_str(&self) -> &'static str {
        match self {
            Meter::Grace => "grace",
            Meter::Fear => "fear",
            Meter::Fury => "fury",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "grace" => Some(Meter::Grace),
            "fear" => Some(Meter::Fear),
            "fury" => Some(Meter::Fury),
            _ => None,
        }
    }

    /// Inclusive upper bound
    pub fn max(&self) -> u8 {
        match self {
            Meter::Grace => 3,
            Meter::Fear | Meter::Fury => 5,
        }
    }

    /// Value on a fresh sheet
    pub fn initial(&self) -> u8 {
        match self {
            Meter::Grace => 3,
            Meter::Fear | Meter::Fury => 0,
        }
    }
}

/// Any field holding an integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    Skill(Quadrant),
    Meter(Meter),
}

impl NumericField {
    pub fn key(&self) -> &'static str {
        match self {
            NumericField::Skill(q) => q.as_str(),
            NumericField::Meter(m) => m.as_str(),
        }
    }

    /// Exact-key lookup (`Heart`, `grace`, ...)
    pub fn from_key(key: &str) -> Option<Self> {
        if let Some(q) = Quadrant::ALL.into_iter().find(|q| q.as_str() == key) {
            return Some(NumericField::Skill(q));
        }
        Meter::ALL
            .into_iter()
            .find(|m| m.as_str() == key)
            .map(NumericField::Meter)
    }

    pub fn max(&self) -> u8 {
        match self {
            NumericField::Skill(_) => SKILL_MAX,
            NumericField::Meter(m) => m.max(),
        }
    }

    pub fn default_value(&self) -> u8 {
        match self {
            NumericField::Skill(_) => 0,
            NumericField::Meter(m) => m.initial(),
        }
    }

    /// Clamp an integer into `0..=max`
    pub fn clamp(&self, value: i64) -> u8 {
        // Bounded by max() so the cast cannot truncate
        value.clamp(0, i64::from(self.max())) as u8
    }

    /// Coerce form/storage text to this field's range.
    /// Unparsable text falls back to the field default.
    pub fn coerce(&self, raw: &str) -> u8 {
        match parse_int(raw) {
            Some(v) => self.clamp(v),
            None => self.default_value(),
        }
    }
}

/// Leading-integer parse: optional whitespace and sign, then digits; the
/// remainder is ignored ("2 points" -> 2). Returns None without digits.
pub fn parse_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Saturate absurdly long digit runs; they clamp to the field max anyway
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Free-text fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    CharacterName,
    PlayerName,
    Appearance,
    Flaw,
    Verse,
    Stunt,
    Notes,
    Aspect(Quadrant),
}

impl TextField {
    pub const PLAIN: [TextField; 7] = [
        TextField::CharacterName,
        TextField::PlayerName,
        TextField::Appearance,
        TextField::Flaw,
        TextField::Verse,
        TextField::Stunt,
        TextField::Notes,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            TextField::CharacterName => "characterName",
            TextField::PlayerName => "playerName",
            TextField::Appearance => "appearance",
            TextField::Flaw => "flaw",
            TextField::Verse => "verse",
            TextField::Stunt => "stunt",
            TextField::Notes => "notes",
            TextField::Aspect(q) => q.aspect_key(),
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        if let Some(f) = Self::PLAIN.into_iter().find(|f| f.key() == key) {
            return Some(f);
        }
        Quadrant::ALL
            .into_iter()
            .find(|q| q.aspect_key() == key)
            .map(TextField::Aspect)
    }
}

/// A character sheet as edited and persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CharacterRecord {
    // === Identity ===
    pub character_name: String,
    pub player_name: String,

    // === Narrative ===
    pub appearance: String,
    pub flaw: String,
    pub verse: String,
    pub stunt: String,
    pub notes: String,

    // === Meters ===
    #[serde(deserialize_with = "de_grace")]
    pub grace: u8,
    #[serde(deserialize_with = "de_fear")]
    pub fear: u8,
    #[serde(deserialize_with = "de_fury")]
    pub fury: u8,

    /// Portrait as a `data:image/...;base64,` URI
    pub character_image: Option<String>,

    // === Skills ===
    #[serde(rename = "Heart", deserialize_with = "de_skill")]
    pub heart: u8,
    #[serde(rename = "Soul", deserialize_with = "de_skill")]
    pub soul: u8,
    #[serde(rename = "Mind", deserialize_with = "de_skill")]
    pub mind: u8,
    #[serde(rename = "Strength", deserialize_with = "de_skill")]
    pub strength: u8,

    // === Aspects ===
    pub heart_aspect: String,
    pub soul_aspect: String,
    pub mind_aspect: String,
    pub strength_aspect: String,

    // === Stress ===
    pub heart_stress: StressTrack,
    pub soul_stress: StressTrack,
    pub mind_stress: StressTrack,
    pub strength_stress: StressTrack,
}

impl Default for CharacterRecord {
    fn default() -> Self {
        Self {
            character_name: String::new(),
            player_name: String::new(),

            appearance: String::new(),
            flaw: String::new(),
            verse: String::new(),
            stunt: String::new(),
            notes: String::new(),

            grace: Meter::Grace.initial(),
            fear: Meter::Fear.initial(),
            fury: Meter::Fury.initial(),

            character_image: None,

            heart: 0,
            soul: 0,
            mind: 0,
            strength: 0,

            heart_aspect: String::new(),
            soul_aspect: String::new(),
            mind_aspect: String::new(),
            strength_aspect: String::new(),

            heart_stress: [false; STRESS_BOXES],
            soul_stress: [false; STRESS_BOXES],
            mind_stress: [false; STRESS_BOXES],
            strength_stress: [false; STRESS_BOXES],
        }
    }
}

/// A fresh sheet: grace 3, everything else zeroed or empty
pub fn default_record() -> CharacterRecord {
    CharacterRecord::default()
}

impl CharacterRecord {
    pub fn skill(&self, quadrant: Quadrant) -> u8 {
        match quadrant {
            Quadrant::Heart => self.heart,
            Quadrant::Soul => self.soul,
            Quadrant::Mind => self.mind,
            Quadrant::Strength => self.strength,
        }
    }

    fn skill_mut(&mut self, quadrant: Quadrant) -> &mut u8 {
        match quadrant {
            Quadrant::Heart => &mut self.heart,
            Quadrant::Soul => &mut self.soul,
            Quadrant::Mind => &mut self.mind,
            Quadrant::Strength => &mut self.strength,
        }
    }

    pub fn meter(&self, meter: Meter) -> u8 {
        match meter {
            Meter::Grace => self.grace,
            Meter::Fear => self.fear,
            Meter::Fury => self.fury,
        }
    }

    fn meter_mut(&mut self, meter: Meter) -> &mut u8 {
        match meter {
            Meter::Grace => &mut self.grace,
            Meter::Fear => &mut self.fear,
            Meter::Fury => &mut self.fury,
        }
    }

    pub fn numeric(&self, field: NumericField) -> u8 {
        match field {
            NumericField::Skill(q) => self.skill(q),
            NumericField::Meter(m) => self.meter(m),
        }
    }

    /// Store a numeric value, clamped into the field's range
    pub fn set_numeric(&mut self, field: NumericField, value: i64) {
        let value = field.clamp(value);
        match field {
            NumericField::Skill(q) => *self.skill_mut(q) = value,
            NumericField::Meter(m) => *self.meter_mut(m) = value,
        }
    }

    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::CharacterName => &self.character_name,
            TextField::PlayerName => &self.player_name,
            TextField::Appearance => &self.appearance,
            TextField::Flaw => &self.flaw,
            TextField::Verse => &self.verse,
            TextField::Stunt => &self.stunt,
            TextField::Notes => &self.notes,
            TextField::Aspect(q) => self.aspect(q),
        }
    }

    pub fn text_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::CharacterName => &mut self.character_name,
            TextField::PlayerName => &mut self.player_name,
            TextField::Appearance => &mut self.appearance,
            TextField::Flaw => &mut self.flaw,
            TextField::Verse => &mut self.verse,
            TextField::Stunt => &mut self.stunt,
            TextField::Notes => &mut self.notes,
            TextField::Aspect(Quadrant::Heart) => &mut self.heart_aspect,
            TextField::Aspect(Quadrant::Soul) => &mut self.soul_aspect,
            TextField::Aspect(Quadrant::Mind) => &mut self.mind_aspect,
            TextField::Aspect(Quadrant::Strength) => &mut self.strength_aspect,
        }
    }

    pub fn aspect(&self, quadrant: Quadrant) -> &str {
        match quadrant {
            Quadrant::Heart => &self.heart_aspect,
            Quadrant::Soul => &self.soul_aspect,
            Quadrant::Mind => &self.mind_aspect,
            Quadrant::Strength => &self.strength_aspect,
        }
    }

    pub fn stress(&self, quadrant: Quadrant) -> StressTrack {
        match quadrant {
            Quadrant::Heart => self.heart_stress,
            Quadrant::Soul => self.soul_stress,
            Quadrant::Mind => self.mind_stress,
            Quadrant::Strength => self.strength_stress,
        }
    }

    pub fn set_stress(&mut self, quadrant: Quadrant, track: StressTrack) {
        match quadrant {
            Quadrant::Heart => self.heart_stress = track,
            Quadrant::Soul => self.soul_stress = track,
            Quadrant::Mind => self.mind_stress = track,
            Quadrant::Strength => self.strength_stress = track,
        }
    }

    /// The four skill scores, for allocation checks
    pub fn skill_scores(&self) -> SkillScores {
        SkillScores {
            heart: self.heart,
            soul: self.soul,
            mind: self.mind,
            strength: self.strength,
        }
    }
}

/// Any JSON shape a numeric field may arrive as
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

fn lenient<'de, D>(deserializer: D, field: NumericField) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawNumber::deserialize(deserializer)? {
        RawNumber::Int(v) => field.clamp(v),
        RawNumber::Float(v) if v.is_finite() => field.clamp(v.trunc() as i64),
        RawNumber::Text(s) => field.coerce(&s),
        RawNumber::Float(_) | RawNumber::Other(_) => field.default_value(),
    })
}

fn de_skill<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    // Every skill shares range and default
    lenient(deserializer, NumericField::Skill(Quadrant::Heart))
}

fn de_grace<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    lenient(deserializer, NumericField::Meter(Meter::Grace))
}

fn de_fear<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    lenient(deserializer, NumericField::Meter(Meter::Fear))
}

fn de_fury<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    lenient(deserializer, NumericField::Meter(Meter::Fury))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record() {
        let r = default_record();
        assert_eq!(r.grace, 3);
        assert_eq!(r.fear, 0);
        assert_eq!(r.fury, 0);
        for q in Quadrant::ALL {
            assert_eq!(r.skill(q), 0);
            assert_eq!(r.stress(q), [false; STRESS_BOXES]);
            assert!(r.aspect(q).is_empty());
        }
        assert!(r.character_image.is_none());
        assert!(r.character_name.is_empty());
    }

    #[test]
    fn test_numeric_field_names() {
        for name in NUMERIC_FIELD_NAMES {
            let field = NumericField::from_key(name).expect("numeric key resolves");
            assert_eq!(field.key(), name);
        }
        assert!(is_numeric_field("grace"));
        assert!(!is_numeric_field("heartAspect"));
        assert!(!is_numeric_field("heart")); // skill keys are capitalised
    }

    #[test]
    fn test_parse_int_leading_digits() {
        assert_eq!(parse_int("2"), Some(2));
        assert_eq!(parse_int("  3abc"), Some(3));
        assert_eq!(parse_int("-1"), Some(-1));
        assert_eq!(parse_int("+2"), Some(2));
        assert_eq!(parse_int("2.9"), Some(2));
        assert_eq!(parse_int("abc"), None);
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("-"), None);
    }

    #[test]
    fn test_coerce_clamps_and_defaults() {
        let grace = NumericField::Meter(Meter::Grace);
        assert_eq!(grace.coerce("9"), 3);
        assert_eq!(grace.coerce("-4"), 0);
        assert_eq!(grace.coerce("nope"), 3);
        let fear = NumericField::Meter(Meter::Fear);
        assert_eq!(fear.coerce("5"), 5);
        assert_eq!(fear.coerce("6"), 5);
    }

    #[test]
    fn test_serialized_keys_match_storage_layout() {
        let json = serde_json::to_value(default_record()).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "characterName",
            "playerName",
            "appearance",
            "characterImage",
            "Heart",
            "Strength",
            "grace",
            "heartAspect",
            "strengthStress",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert_eq!(obj["characterImage"], serde_json::Value::Null);
    }

    #[test]
    fn test_textual_numbers_are_coerced_on_load() {
        let json = r#"{"Heart":"3","Soul":"1","Mind":2,"Strength":"2","grace":"1","fear":"4","fury":2.0}"#;
        let r: CharacterRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.heart, 3);
        assert_eq!(r.soul, 1);
        assert_eq!(r.mind, 2);
        assert_eq!(r.strength, 2);
        assert_eq!(r.grace, 1);
        assert_eq!(r.fear, 4);
        assert_eq!(r.fury, 2);
    }

    #[test]
    fn test_missing_fields_keep_defaults() {
        let r: CharacterRecord =
            serde_json::from_str(r#"{"characterName":"Elias","fear":2}"#).unwrap();
        assert_eq!(r.character_name, "Elias");
        assert_eq!(r.fear, 2);
        assert_eq!(r.grace, 3);
        assert_eq!(r.heart_stress, [false; STRESS_BOXES]);
    }

    #[test]
    fn test_garbage_numeric_values_fall_back() {
        let r: CharacterRecord =
            serde_json::from_str(r#"{"grace":null,"Heart":"x","fear":true,"fury":99}"#).unwrap();
        assert_eq!(r.grace, 3);
        assert_eq!(r.heart, 0);
        assert_eq!(r.fear, 0);
        assert_eq!(r.fury, 5);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let r: CharacterRecord = serde_json::from_str(r#"{"legacyField":1,"Mind":2}"#).unwrap();
        assert_eq!(r.mind, 2);
    }

    #[test]
    fn test_set_numeric_clamps() {
        let mut r = default_record();
        r.set_numeric(NumericField::Skill(Quadrant::Soul), 7);
        assert_eq!(r.soul, SKILL_MAX);
        r.set_numeric(NumericField::Meter(Meter::Fury), -3);
        assert_eq!(r.fury, 0);
    }

    #[test]
    fn test_text_field_keys() {
        assert_eq!(
            TextField::from_key("mindAspect"),
            Some(TextField::Aspect(Quadrant::Mind))
        );
        assert_eq!(TextField::from_key("notes"), Some(TextField::Notes));
        assert_eq!(TextField::from_key("Heart"), None);

        let mut r = default_record();
        *r.text_mut(TextField::Aspect(Quadrant::Soul)) = "steady".into();
        assert_eq!(r.soul_aspect, "steady");
        assert_eq!(r.text(TextField::Aspect(Quadrant::Soul)), "steady");
    }
}
