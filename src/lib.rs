/*!
This library holds two offline tools for the NER pipeline on historical
charters (the HOME corpus of Czech, German and Latin documents).

# BIO CONVERSION
The charters are transcribed by a model that does HTR and NER at the same
time: entity boundaries appear as inline markers (`<date>`, `</date>`, ...)
interleaved with the words of each line. The [`BioConverter`] turns such a
file into a token-per-line BIO file (`word label`), grouped by document and
naturally ordered by line identifier. The coherence of the opening and
closing markers in predictions is not assured; the converter documents and
applies a fixed best-effort policy for nested and malformed sequences (see
the `bio` module docs).

# ENTITY STATISTICS
The ground-truth corpus is stored as PAGE-XML with entity spans in the
`custom` attribute of every text line. The [`StatsCollector`] walks the
per-language directory trees, tallies entities by kind and language, detects
nested and overflowing spans and derives average entity lengths in characters
and tokens. Results render as text tables through [`StatsReport`].

# Terminology
* A *kind* is an entity class: `PER`, `LOC`, `DAT` or `ORG`.
* A *BIO label* marks a token as `B`eginning an entity, being `I`nside one,
  or `O`utside any.
* A *span* is one entity occurrence in a line, given by character offset and
  length, possibly marked `continued` when it runs over to the next line.
*/

mod bio;
mod config;
mod label;
mod natural;
mod reporter;
mod stats;

// The public api starts here
pub use bio::{BioConverter, ConvertError, DocumentLines, FileContent, TaggedToken};

pub use config::{
    BioConfig, BioConfigBuilder, DivByZeroStrat, ParsingDivisionByZeroStrategyError, StatsConfig,
    StatsConfigBuilder,
};

pub use label::{
    BioLabel, EntityKind, EntityKindParsingError, TypeMap, UnknownTypePolicy,
    UnknownTypePolicyParsingError,
};

pub use natural::{natural_cmp, NaturalKey};

pub use reporter::{
    CountReport, CountRow, LengthReport, LengthRow, MetaReport, MetaRow, StatsReport, TotalRow,
    TotalsReport,
};

pub use stats::{
    CorpusTally, EntitySpan, Language, Overflow, StatsCollector, StatsError, NE_KINDS,
};
