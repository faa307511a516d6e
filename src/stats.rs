/**
This module computes corpus statistics on the named entities of a charter
corpus stored as PAGE-XML.

The corpus root holds one subdirectory per language; every `*.xml` file under
a `page/` path segment is a PAGE-XML document. Entity spans live in the
`custom` attribute of each `TextLine`, one annotation per occurrence of the
shape `TYPE {offset:N; length:M;[ continued]`. Offsets and lengths are in
characters of the line's `TextEquiv` text.

Per line, spans sorted by (offset ascending, length descending) are
classified against the end of the most recent top-level span: a span starting
before that end is nested and does not advance it. A nested span ending past
its parent's end is additionally tallied as exceeding, and the overflowing
substring is kept for the diagnostic summary. A span marked `continued` is
counted once across the two lines it covers unless configured otherwise; the
carry flag lives at the `TextRegion` level so it survives the line change.
*/
use crate::config::StatsConfig;
use crate::label::EntityKind;
use enum_iterator::{all, Sequence};
use ndarray::{Array1, Array2};
use regex::Regex;
use roxmltree::Node;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Display};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Files are transcriptions only when their path ends in a `page/` segment
/// followed by an XML file name.
const FILENAME_PATTERN: &str = r"page/.+\.xml$";
/// One entity annotation inside a `custom` attribute.
const NAMED_ENTITIES_PATTERN: &str = r"([\w-]+) \{offset:(\d+); length:(\d+);( continued)?";

/// The entity kinds tallied by the collector, in report order.
pub const NE_KINDS: [EntityKind; 3] = [EntityKind::Per, EntityKind::Loc, EntityKind::Dat];

/// The languages of the corpus. Each one is a subdirectory of the root.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Sequence, Serialize, Deserialize,
)]
pub enum Language {
    Czech,
    German,
    Latin,
}

impl Language {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Czech => "czech",
            Self::German => "german",
            Self::Latin => "latin",
        }
    }

    pub(crate) fn column(&self) -> usize {
        *self as usize
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// One entity annotation extracted from a `custom` attribute, with its type
/// name already resolved to a kind. `offset` and `length` count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySpan {
    pub kind: EntityKind,
    pub offset: usize,
    pub length: usize,
    pub continued: bool,
}

impl EntitySpan {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// A nested span that ran past the end of its parent span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overflow {
    /// Number of characters past the parent's end.
    pub length: usize,
    /// The overflowing substring, `text[parent_end..span_end]`.
    pub text: String,
}

/// Accumulators of a collector run. Entity matrices are indexed by
/// ([`NE_KINDS`] row, [`Language`] column); metadata vectors by language.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusTally {
    pub all: Array2<u64>,
    pub nested: Array2<u64>,
    pub exceed: Array2<u64>,
    pub char_sum: Array2<u64>,
    pub token_sum: Array2<u64>,
    pub images: Array1<u64>,
    pub lines: Array1<u64>,
    pub words: Array1<u64>,
    pub overflows: Vec<Overflow>,
}

impl CorpusTally {
    /// A tally with every accumulator at zero.
    pub fn empty() -> Self {
        let langs = all::<Language>().count();
        let shape = (NE_KINDS.len(), langs);
        Self {
            all: Array2::zeros(shape),
            nested: Array2::zeros(shape),
            exceed: Array2::zeros(shape),
            char_sum: Array2::zeros(shape),
            token_sum: Array2::zeros(shape),
            images: Array1::zeros(langs),
            lines: Array1::zeros(langs),
            words: Array1::zeros(langs),
            overflows: Vec::new(),
        }
    }

    /// Mean overflow length of the nested spans that exceeded their parent,
    /// or `None` when none did.
    pub fn mean_overflow(&self) -> Option<f64> {
        let lengths: Array1<f64> = self.overflows.iter().map(|o| o.length as f64).collect();
        lengths.mean()
    }
}

/// Row of `kind` in the tally matrices, `None` for kinds the collector does
/// not tally (ORG does not occur in the charter annotations).
fn kind_row(kind: EntityKind) -> Option<usize> {
    NE_KINDS.iter().position(|&k| k == kind)
}

/// Errors of the statistics collector.
#[derive(Debug)]
pub enum StatsError {
    Io(io::Error),
    Walk(walkdir::Error),
    Xml {
        path: PathBuf,
        source: roxmltree::Error,
    },
}

impl Display for StatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => std::fmt::Display::fmt(err, f),
            Self::Walk(err) => std::fmt::Display::fmt(err, f),
            Self::Xml { path, source } => {
                write!(f, "Invalid PAGE-XML in {}: {}", path.display(), source)
            }
        }
    }
}
impl Error for StatsError {}

impl From<io::Error> for StatsError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}
impl From<walkdir::Error> for StatsError {
    fn from(value: walkdir::Error) -> Self {
        Self::Walk(value)
    }
}

/// The collector. Holds the configuration and the compiled patterns, built
/// once at construction.
#[derive(Debug)]
pub struct StatsCollector {
    config: StatsConfig,
    file_pattern: Regex,
    entity_pattern: Regex,
}

impl StatsCollector {
    pub fn new(config: StatsConfig) -> Self {
        Self {
            config,
            file_pattern: Regex::new(FILENAME_PATTERN).expect("hard-coded pattern"),
            entity_pattern: Regex::new(NAMED_ENTITIES_PATTERN).expect("hard-coded pattern"),
        }
    }

    /// Walks `root_folder` and tallies every transcription file of every
    /// language subdirectory. Logs a diagnostic summary of the overflowing
    /// nested spans at the end.
    pub fn collect(&self, root_folder: &Path) -> Result<CorpusTally, StatsError> {
        let mut tally = CorpusTally::empty();
        for lang in all::<Language>() {
            info!("Computing statistics on {} data", lang);
            let dir = root_folder.join(lang.dir_name());
            if !dir.is_dir() {
                warn!(path = %dir.display(), "language directory missing, skipping");
                continue;
            }
            for entry in WalkDir::new(&dir) {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let path_str = entry.path().to_string_lossy().replace('\\', "/");
                if !self.file_pattern.is_match(&path_str) {
                    continue;
                }
                let xml = fs::read_to_string(entry.path())?;
                self.tally_document(&xml, entry.path(), lang, &mut tally)?;
            }
        }
        info!(
            count = tally.overflows.len(),
            mean_chars = tally.mean_overflow().unwrap_or(f64::NAN),
            texts = ?tally.overflows.iter().map(|o| o.text.as_str()).collect::<Vec<_>>(),
            "nested entities overflow their parents' length"
        );
        Ok(tally)
    }

    /// Tallies one PAGE-XML document into `tally`. Elements are matched by
    /// the suffix of their tag name, ignoring namespaces.
    pub fn tally_document(
        &self,
        xml: &str,
        path: &Path,
        lang: Language,
        tally: &mut CorpusTally,
    ) -> Result<(), StatsError> {
        let doc = roxmltree::Document::parse(xml).map_err(|source| StatsError::Xml {
            path: PathBuf::from(path),
            source,
        })?;
        let col = lang.column();
        for page in elements_with_suffix(doc.root_element(), "Page") {
            tally.images[col] += 1;
            for region in elements_with_suffix(page, "TextRegion") {
                // Carried across the lines of the region, so that a span
                // marked `continued` on line n and line n+1 is seen as one.
                let mut continued = false;
                for line in elements_with_suffix(region, "TextLine") {
                    tally.lines[col] += 1;
                    let Some(text) = line_text(line) else {
                        continue;
                    };
                    tally.words[col] += text.split(' ').count() as u64;
                    let custom = line.attribute("custom").unwrap_or("");
                    let spans = self.extract_spans(custom);
                    self.tally_line(&spans, text, col, &mut continued, tally);
                }
            }
        }
        Ok(())
    }

    /// Parses every entity annotation out of a `custom` attribute,
    /// dropping annotations whose type name is not in the map, and sorts
    /// them by (offset ascending, length descending) so that the longer of
    /// two spans sharing a start comes first.
    pub fn extract_spans(&self, custom: &str) -> Vec<EntitySpan> {
        let mut spans: Vec<EntitySpan> = self
            .entity_pattern
            .captures_iter(custom)
            .filter_map(|captures| {
                let kind = self.config.type_map.get(&captures[1])?;
                // The pattern only lets digits through, so the parses can
                // only fail on overflow; such a span is dropped.
                let offset = captures[2].parse().ok()?;
                let length = captures[3].parse().ok()?;
                Some(EntitySpan {
                    kind,
                    offset,
                    length,
                    continued: captures.get(4).is_some(),
                })
            })
            .collect();
        spans.sort_by_key(|span| (span.offset, std::cmp::Reverse(span.length)));
        spans
    }

    /// Classifies the sorted spans of one line and updates the tally.
    fn tally_line(
        &self,
        spans: &[EntitySpan],
        text: &str,
        col: usize,
        continued: &mut bool,
        tally: &mut CorpusTally,
    ) {
        let chars: Vec<char> = text.chars().collect();
        let mut last_parent_stop = 0usize;
        for span in spans {
            // Second half of a span split over two lines: already counted.
            if !self.config.split_lines && span.continued && *continued {
                continue;
            }
            *continued = span.continued;

            let Some(row) = kind_row(span.kind) else {
                continue;
            };
            let end = span.end();
            let is_nested = span.offset < last_parent_stop;
            if is_nested {
                if self.config.count_nested {
                    tally.nested[[row, col]] += 1;
                    tally.char_sum[[row, col]] += span.length as u64;
                    tally.all[[row, col]] += 1;
                    if end > last_parent_stop {
                        tally.exceed[[row, col]] += 1;
                    }
                }
                if end > last_parent_stop {
                    tally.overflows.push(Overflow {
                        length: end - last_parent_stop,
                        text: slice_chars(&chars, last_parent_stop, end),
                    });
                }
            } else {
                last_parent_stop = end;
                tally.char_sum[[row, col]] += span.length as u64;
                tally.all[[row, col]] += 1;
            }

            if !is_nested || self.config.count_nested {
                let covered = slice_chars(&chars, span.offset, end);
                tally.token_sum[[row, col]] += covered.split(' ').count() as u64;
            }
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new(StatsConfig::default())
    }
}

/// Child elements of `node` whose tag name ends with `suffix`. PAGE-XML tags
/// are namespace-qualified; matching the local name suffix side-steps the
/// namespace entirely.
fn elements_with_suffix<'a, 'input>(
    node: Node<'a, 'input>,
    suffix: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name().ends_with(suffix))
}

/// The line's transcription: the text of the first child of its `TextEquiv`
/// element, or `None` when absent. When several `TextEquiv` children exist,
/// the last one wins.
fn line_text<'a>(line: Node<'a, '_>) -> Option<&'a str> {
    let mut text = None;
    for equiv in elements_with_suffix(line, "TextEquiv") {
        if let Some(unicode) = equiv.first_element_child() {
            text = unicode.text();
        }
    }
    text
}

/// Substring by character indices, clamped to the text length. Annotations
/// occasionally declare spans past the end of the transcription.
fn slice_chars(chars: &[char], start: usize, stop: usize) -> String {
    let len = chars.len();
    chars[start.min(len)..stop.min(len)].iter().collect()
}
