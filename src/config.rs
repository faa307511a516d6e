/*
 * This module contains the configuration structs of the two tools. Both
 * configs are built once at startup and passed explicitly to the processing
 * functions; there is no ambient global state. The builders implement the
 * Default trait and consume themselves on every setter.
*/
use crate::label::{TypeMap, UnknownTypePolicy};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Display};
use std::str::FromStr;

/// What to do when an average is computed for an entity kind with zero
/// occurrences in a language. The default reports the division honestly as
/// NaN; `ReplaceBy0` renders such cells as zero instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivByZeroStrat {
    /// Report NaN for kinds never seen in a language.
    #[default]
    ReplaceByNaN,
    /// Report 0 for kinds never seen in a language.
    ReplaceBy0,
}

impl DivByZeroStrat {
    pub(crate) fn divide(&self, numerator: f64, denominator: f64) -> f64 {
        if denominator == 0.0 {
            match self {
                Self::ReplaceByNaN => f64::NAN,
                Self::ReplaceBy0 => 0.0,
            }
        } else {
            numerator / denominator
        }
    }
}

impl FromStr for DivByZeroStrat {
    type Err = ParsingDivisionByZeroStrategyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nan" | "replacebynan" => Ok(Self::ReplaceByNaN),
            "zero" | "0" | "replaceby0" => Ok(Self::ReplaceBy0),
            _ => Err(ParsingDivisionByZeroStrategyError(String::from(s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingDivisionByZeroStrategyError(String);

impl Display for ParsingDivisionByZeroStrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Could not parse the {} into a `DivByZeroStrat`", self.0)
    }
}
impl Error for ParsingDivisionByZeroStrategyError {}

/// Configuration of the BIO converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BioConfig {
    /// Mapping from boundary-marker type names to entity kinds.
    pub type_map: TypeMap,
    /// Prepend the line identifier to every output row.
    pub write_ids: bool,
    /// Policy for boundary markers whose type name is not in the map.
    pub unknown_types: UnknownTypePolicy,
}

impl Default for BioConfig {
    fn default() -> Self {
        BioConfigBuilder::new().build()
    }
}

/// Builder for a [`BioConfig`].
#[derive(Debug, Clone, Default)]
pub struct BioConfigBuilder {
    type_map: Option<TypeMap>,
    write_ids: bool,
    unknown_types: UnknownTypePolicy,
}

impl BioConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn type_map(mut self, type_map: TypeMap) -> Self {
        self.type_map = Some(type_map);
        self
    }
    pub fn write_ids(mut self, write_ids: bool) -> Self {
        self.write_ids = write_ids;
        self
    }
    pub fn unknown_types(mut self, policy: UnknownTypePolicy) -> Self {
        self.unknown_types = policy;
        self
    }
    pub fn build(self) -> BioConfig {
        BioConfig {
            type_map: self.type_map.unwrap_or_else(TypeMap::inline_tag_defaults),
            write_ids: self.write_ids,
            unknown_types: self.unknown_types,
        }
    }
}

/// Configuration of the entity statistics collector.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsConfig {
    /// Mapping from `custom`-attribute type names to entity kinds.
    pub type_map: TypeMap,
    /// Count a span marked `continued` on both of its lines (i.e. twice)
    /// instead of deduplicating the second half.
    pub split_lines: bool,
    /// Include nested spans in the counters and the length sums. When off,
    /// nested spans contribute nothing to the statistics; overflow
    /// diagnostics are still collected.
    pub count_nested: bool,
    /// Strategy for averages over kinds with zero occurrences.
    pub zero_division: DivByZeroStrat,
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfigBuilder::new().build()
    }
}

/// Builder for a [`StatsConfig`].
#[derive(Debug, Clone)]
pub struct StatsConfigBuilder {
    type_map: Option<TypeMap>,
    split_lines: bool,
    count_nested: bool,
    zero_division: DivByZeroStrat,
}

impl Default for StatsConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsConfigBuilder {
    pub fn new() -> Self {
        Self {
            type_map: None,
            split_lines: false,
            count_nested: true,
            zero_division: DivByZeroStrat::default(),
        }
    }
    pub fn type_map(mut self, type_map: TypeMap) -> Self {
        self.type_map = Some(type_map);
        self
    }
    pub fn split_lines(mut self, split_lines: bool) -> Self {
        self.split_lines = split_lines;
        self
    }
    pub fn count_nested(mut self, count_nested: bool) -> Self {
        self.count_nested = count_nested;
        self
    }
    pub fn zero_division(mut self, zero_division: DivByZeroStrat) -> Self {
        self.zero_division = zero_division;
        self
    }
    pub fn build(self) -> StatsConfig {
        StatsConfig {
            type_map: self.type_map.unwrap_or_else(TypeMap::custom_attr_defaults),
            split_lines: self.split_lines,
            count_nested: self.count_nested,
            zero_division: self.zero_division,
        }
    }
}
