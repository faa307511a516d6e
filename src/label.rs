/**
This module holds the named entity vocabulary shared by the converter and the
statistics collector: the entity kinds, the BIO label attached to a token and
the configurable mapping from annotation type names to entity kinds.
*/
use ahash::AHashMap;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Display};
use std::str::FromStr;

/// A named entity kind. The vocabulary is closed: these four codes are the
/// ones used by the charter annotations. The inline-tag names
/// (`persName`, ...) and the PAGE-XML `custom` names (`person`, ...) both map
/// into this enum through a [`TypeMap`].
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Sequence, Serialize, Deserialize,
)]
pub enum EntityKind {
    Per,
    Loc,
    Dat,
    Org,
}

impl EntityKind {
    /// Short code used in BIO labels and report rows.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Per => "PER",
            Self::Loc => "LOC",
            Self::Dat => "DAT",
            Self::Org => "ORG",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for EntityKind {
    type Err = EntityKindParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PER" => Ok(Self::Per),
            "LOC" => Ok(Self::Loc),
            "DAT" => Ok(Self::Dat),
            "ORG" => Ok(Self::Org),
            _ => Err(EntityKindParsingError(String::from(s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityKindParsingError(String);

impl Display for EntityKindParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into an EntityKind",
            self.0
        )
    }
}
impl Error for EntityKindParsingError {}

/// BIO label of a single token. A token outside any entity is `Outside` and
/// renders as a bare `O`: the outside state is never prefixed, so `B-O` and
/// `I-O` cannot be produced.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum BioLabel {
    Outside,
    Begin(EntityKind),
    Inside(EntityKind),
}

impl Display for BioLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outside => write!(f, "O"),
            Self::Begin(kind) => write!(f, "B-{}", kind),
            Self::Inside(kind) => write!(f, "I-{}", kind),
        }
    }
}

/// Mapping from annotation type names to entity kinds. The two input formats
/// use different names for the same kinds, so each tool starts from its own
/// default table; both can be extended with extra aliases at configuration
/// time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMap {
    inner: AHashMap<String, EntityKind>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self {
            inner: AHashMap::new(),
        }
    }

    /// Default table for the inline-tag transcription format used by the
    /// converter.
    pub fn inline_tag_defaults() -> Self {
        let mut map = Self::new();
        map.insert("persName", EntityKind::Per);
        map.insert("placeName", EntityKind::Loc);
        map.insert("date", EntityKind::Dat);
        map.insert("orgName", EntityKind::Org);
        map
    }

    /// Default table for the PAGE-XML `custom` attribute format used by the
    /// statistics collector.
    pub fn custom_attr_defaults() -> Self {
        let mut map = Self::new();
        map.insert("person", EntityKind::Per);
        map.insert("place", EntityKind::Loc);
        map.insert("date", EntityKind::Dat);
        map
    }

    pub fn insert(&mut self, name: &str, kind: EntityKind) {
        self.inner.insert(String::from(name), kind);
    }

    pub fn get(&self, name: &str) -> Option<EntityKind> {
        self.inner.get(name).copied()
    }
}

impl Default for TypeMap {
    fn default() -> Self {
        Self::inline_tag_defaults()
    }
}

/// What the converter does when a boundary marker names a type absent from
/// the [`TypeMap`]. The transcription source is known to contain mismatched
/// *closing* tags, which are always ignored, but an unknown *type name* is a
/// vocabulary problem and aborts the run unless `Skip` is requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownTypePolicy {
    /// Fail the conversion with an error naming the type and the line.
    #[default]
    Fail,
    /// Drop the marker, log a warning and keep going.
    Skip,
}

impl FromStr for UnknownTypePolicy {
    type Err = UnknownTypePolicyParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" | "error" => Ok(Self::Fail),
            "skip" => Ok(Self::Skip),
            _ => Err(UnknownTypePolicyParsingError(String::from(s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTypePolicyParsingError(String);

impl Display for UnknownTypePolicyParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into an UnknownTypePolicy",
            self.0
        )
    }
}
impl Error for UnknownTypePolicyParsingError {}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BioLabel::Outside, "O")]
    #[case(BioLabel::Begin(EntityKind::Dat), "B-DAT")]
    #[case(BioLabel::Inside(EntityKind::Per), "I-PER")]
    #[case(BioLabel::Begin(EntityKind::Org), "B-ORG")]
    fn test_label_display(#[case] label: BioLabel, #[case] expected: &str) {
        assert_eq!(label.to_string(), expected)
    }

    #[rstest]
    #[case("PER", EntityKind::Per)]
    #[case("loc", EntityKind::Loc)]
    #[case("Dat", EntityKind::Dat)]
    fn test_kind_from_str(#[case] input: &str, #[case] expected: EntityKind) {
        assert_eq!(input.parse::<EntityKind>().unwrap(), expected)
    }

    #[test]
    fn test_kind_from_str_unknown() {
        assert!("GPE".parse::<EntityKind>().is_err())
    }

    #[test]
    fn test_inline_tag_defaults() {
        let map = TypeMap::inline_tag_defaults();
        assert_eq!(map.get("persName"), Some(EntityKind::Per));
        assert_eq!(map.get("placeName"), Some(EntityKind::Loc));
        assert_eq!(map.get("date"), Some(EntityKind::Dat));
        assert_eq!(map.get("orgName"), Some(EntityKind::Org));
        assert_eq!(map.get("person"), None);
    }

    #[test]
    fn test_custom_attr_defaults_has_no_org() {
        let map = TypeMap::custom_attr_defaults();
        assert_eq!(map.get("orgName"), None);
        assert_eq!(map.get("org"), None);
        assert_eq!(map.get("date"), Some(EntityKind::Dat));
    }

    #[test]
    fn test_type_map_extension() {
        let mut map = TypeMap::inline_tag_defaults();
        map.insert("geogName", EntityKind::Loc);
        assert_eq!(map.get("geogName"), Some(EntityKind::Loc));
    }
}
