/**
This module gives a few tools to prettyprint the output of the statistics
collector: the metadata, count, length and totals tables. Each table renders
as if it were a dataframe and can be serialized as is.
*/
use crate::config::DivByZeroStrat;
use crate::label::EntityKind;
use crate::stats::{CorpusTally, Language, NE_KINDS};
use enum_iterator::all;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

fn language_header() -> String {
    all::<Language>().map(|lang| lang.to_string()).join(", ")
}

fn join_u64(values: &[u64]) -> String {
    values.iter().join(", ")
}

fn join_f64(values: &[f64]) -> String {
    values.iter().join(", ")
}

/// Corpus size metadata: images, lines and words per language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaReport {
    pub rows: Vec<MetaRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaRow {
    pub metric: String,
    pub values: Vec<u64>,
}

impl Display for MetaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Metric, {}", language_header())?;
        for row in &self.rows {
            writeln!(f, "{}, {}", row.metric, join_u64(&row.values))?;
        }
        Ok(())
    }
}

/// Occurrence counts per kind: all, nested and exceeding, per language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountReport {
    pub rows: Vec<CountRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRow {
    pub kind: EntityKind,
    pub metric: String,
    pub values: Vec<u64>,
}

impl Display for CountReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Type, Count, {}", language_header())?;
        for row in &self.rows {
            writeln!(f, "{}, {}, {}", row.kind, row.metric, join_u64(&row.values))?;
        }
        Ok(())
    }
}

/// Average entity lengths per kind, in characters and in tokens, per
/// language. A kind with zero occurrences in a language renders according to
/// the division-by-zero strategy the report was built with (NaN by default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthReport {
    pub rows: Vec<LengthRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthRow {
    pub kind: EntityKind,
    pub metric: String,
    pub values: Vec<f64>,
}

impl Display for LengthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Type, Length, {}", language_header())?;
        for row in &self.rows {
            writeln!(f, "{}, {}, {}", row.kind, row.metric, join_f64(&row.values))?;
        }
        Ok(())
    }
}

/// Raw top-level occurrence counts per kind and language (the `all` row of
/// the count table, on its own).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsReport {
    pub rows: Vec<TotalRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalRow {
    pub kind: EntityKind,
    pub values: Vec<u64>,
}

impl Display for TotalsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Type, {}", language_header())?;
        for row in &self.rows {
            writeln!(f, "{}, {}", row.kind, join_u64(&row.values))?;
        }
        Ok(())
    }
}

/// The full report of a collector run.
///
/// # Example
///
/// ```rust
/// use charter_ner::{DivByZeroStrat, StatsCollector, StatsReport};
/// use std::path::Path;
///
/// let collector = StatsCollector::default();
/// let mut tally = charter_ner::CorpusTally::empty();
/// let xml = r#"<?xml version="1.0"?>
/// <PcGts xmlns="http://schema.primaresearch.org/PAGE/gts/pagecontent/2013-07-15">
///   <Page><TextRegion>
///     <TextLine custom="person {offset:0; length:4;}">
///       <TextEquiv><Unicode>Jan z Prahy</Unicode></TextEquiv>
///     </TextLine>
///   </TextRegion></Page>
/// </PcGts>"#;
/// collector
///     .tally_document(xml, Path::new("page/t.xml"), charter_ner::Language::Czech, &mut tally)
///     .unwrap();
///
/// let report = StatsReport::from_tally(&tally, DivByZeroStrat::ReplaceBy0);
/// let expected = "Type, czech, german, latin
/// PER, 1, 0, 0
/// LOC, 0, 0, 0
/// DAT, 0, 0, 0\n";
/// assert_eq!(report.totals.to_string(), expected);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub metadata: MetaReport,
    pub counts: CountReport,
    pub lengths: LengthReport,
    pub totals: TotalsReport,
}

impl StatsReport {
    /// Derives the four tables from the raw tally. Averages divide the
    /// summed lengths by the `all` count of the kind, following
    /// `zero_division` for kinds never seen in a language.
    pub fn from_tally(tally: &CorpusTally, zero_division: DivByZeroStrat) -> Self {
        let langs: Vec<usize> = all::<Language>().map(|lang| lang.column()).collect();

        let metadata = MetaReport {
            rows: vec![
                MetaRow {
                    metric: String::from("images"),
                    values: tally.images.to_vec(),
                },
                MetaRow {
                    metric: String::from("lines"),
                    values: tally.lines.to_vec(),
                },
                MetaRow {
                    metric: String::from("words"),
                    values: tally.words.to_vec(),
                },
            ],
        };

        let mut counts = CountReport { rows: Vec::new() };
        let mut lengths = LengthReport { rows: Vec::new() };
        let mut totals = TotalsReport { rows: Vec::new() };
        for (row, &kind) in NE_KINDS.iter().enumerate() {
            let per_lang = |matrix: &ndarray::Array2<u64>| -> Vec<u64> {
                langs.iter().map(|&col| matrix[[row, col]]).collect()
            };
            let all_counts = per_lang(&tally.all);
            counts.rows.push(CountRow {
                kind,
                metric: String::from("all"),
                values: all_counts.clone(),
            });
            counts.rows.push(CountRow {
                kind,
                metric: String::from("nested"),
                values: per_lang(&tally.nested),
            });
            counts.rows.push(CountRow {
                kind,
                metric: String::from("exceed"),
                values: per_lang(&tally.exceed),
            });

            let averages = |sums: &[u64]| -> Vec<f64> {
                sums.iter()
                    .zip(&all_counts)
                    .map(|(&sum, &count)| zero_division.divide(sum as f64, count as f64))
                    .collect()
            };
            lengths.rows.push(LengthRow {
                kind,
                metric: String::from("avg_char"),
                values: averages(&per_lang(&tally.char_sum)),
            });
            lengths.rows.push(LengthRow {
                kind,
                metric: String::from("avg_tokens"),
                values: averages(&per_lang(&tally.token_sum)),
            });

            totals.rows.push(TotalRow {
                kind,
                values: all_counts,
            });
        }

        Self {
            metadata,
            counts,
            lengths,
            totals,
        }
    }
}

/// The full report prints its four tables with the banner separators of the
/// original reporting tool.
impl Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "***************METADATA***********************************")?;
        write!(f, "{}", self.metadata)?;
        writeln!(f, "***************COUNTER***********************************")?;
        write!(f, "{}", self.counts)?;
        writeln!(f, "***************LENGTH STATISTICS*************************")?;
        write!(f, "{}", self.lengths)?;
        writeln!(f, "***************TOTALS************************************")?;
        write!(f, "{}", self.totals)
    }
}
