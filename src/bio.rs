/**
This module converts transcription files with inline entity boundary markers
into token-per-line BIO files.

The input format is one transcription line per file line: a line identifier
followed by whitespace-separated tokens, where a token of the form `<TYPE>`
opens an entity and `</TYPE>` closes one. Entities are annotated per line, so
an entity overlapping two lines is re-opened on the second line. The opening
and closing of markers in model predictions is not guaranteed to be coherent;
the resolution below is deliberately best-effort:

* a newly opened entity immediately becomes the active tag, shadowing any
  entity still open around it;
* when the inner entity closes, the outer one resumes as `I-`, not `B-`;
* a closing marker for an entity that is not open is ignored;
* a token emitted while no entity is open is labeled bare `O`, even right
  after an open-then-immediately-closed marker pair.
*/
use crate::config::BioConfig;
use crate::label::{BioLabel, EntityKind, UnknownTypePolicy};
use crate::natural::natural_cmp;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Display};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::mem::take;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Any of `. , : ; ? !` becomes its own token before labeling.
const PUNCTUATION_PATTERN: &str = r"\s?([.,:;?!])\s?";
/// A boundary marker is a full token of the form `<TYPE>` or `</TYPE>`.
const MARKER_PATTERN: &str = r"^</?([^/]+)>$";

/// A word paired with its BIO label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub token: String,
    pub label: BioLabel,
}

/// The labeled lines of one contiguous run of a document in the input file.
/// Lines are naturally sorted by their identifier. Grouping is by immediate
/// adjacency of identical document ids: the input is expected to arrive
/// grouped by document, and a document id that reappears later in the file
/// starts a second, separate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLines {
    pub doc_id: String,
    pub lines: Vec<(String, Vec<TaggedToken>)>,
}

/// Output of a whole-file conversion, in document order.
pub type FileContent = Vec<DocumentLines>;

/// Errors of the converter.
#[derive(Debug)]
pub enum ConvertError {
    Io(io::Error),
    /// The input file contained no line at all.
    EmptyInput,
    /// A line had no token to use as a line identifier (1-based line number).
    MissingLineId(usize),
    /// A boundary marker named a type absent from the type map.
    UnknownEntityType { name: String, line_id: String },
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => std::fmt::Display::fmt(err, f),
            Self::EmptyInput => write!(f, "The input file is empty"),
            Self::MissingLineId(n) => {
                write!(f, "Line {} has no line identifier", n)
            }
            Self::UnknownEntityType { name, line_id } => write!(
                f,
                "Unknown entity type ({}) in a boundary marker of line {}",
                name, line_id
            ),
        }
    }
}
impl Error for ConvertError {}

impl From<io::Error> for ConvertError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// The converter itself. Holds the configuration and the compiled patterns,
/// built once at construction.
#[derive(Debug)]
pub struct BioConverter {
    config: BioConfig,
    punctuation: Regex,
    marker: Regex,
}

impl BioConverter {
    pub fn new(config: BioConfig) -> Self {
        Self {
            config,
            punctuation: Regex::new(PUNCTUATION_PATTERN).expect("hard-coded pattern"),
            marker: Regex::new(MARKER_PATTERN).expect("hard-coded pattern"),
        }
    }

    /// Converts one input file and writes the BIO output next to it (same
    /// base name, `bio` extension) or at `output` when given. Returns the
    /// path written to, or `None` when there was nothing to write and no
    /// file was created.
    pub fn convert_to_bio(
        &self,
        input: &Path,
        output: Option<&Path>,
    ) -> Result<Option<PathBuf>, ConvertError> {
        let content = self.convert_file(input)?;
        let output = output
            .map(PathBuf::from)
            .unwrap_or_else(|| input.with_extension("bio"));
        if self.write_bio_file(&content, &output)? {
            Ok(Some(output))
        } else {
            Ok(None)
        }
    }

    /// Reads and converts a whole input file.
    pub fn convert_file(&self, input: &Path) -> Result<FileContent, ConvertError> {
        let reader = BufReader::new(File::open(input)?);
        self.convert_reader(reader)
    }

    /// Converts in-memory input. Used by the tests.
    pub fn convert_str(&self, content: &str) -> Result<FileContent, ConvertError> {
        self.convert_reader(content.as_bytes())
    }

    /// Converts every line of `reader`, grouping lines into documents by
    /// adjacency of their computed document id and naturally sorting each
    /// group when it closes. The last group is flushed after the scan.
    pub fn convert_reader<R: BufRead>(&self, reader: R) -> Result<FileContent, ConvertError> {
        let mut file_content: FileContent = Vec::new();
        let mut last_doc_id: Option<String> = None;
        let mut doc_lines: Vec<(String, Vec<TaggedToken>)> = Vec::new();

        for (index, raw) in reader.lines().enumerate() {
            let raw = raw?;
            let mut tokens = raw.split_whitespace();
            let line_id = tokens
                .next()
                .ok_or(ConvertError::MissingLineId(index + 1))?;
            let doc_id = doc_id_of(line_id);
            let rest = tokens.collect::<Vec<_>>().join(" ");

            let words = self.resolve_line(&rest, line_id)?;

            // End of a document: sort its lines and store it under the id it
            // was accumulated for.
            if let Some(last) = &last_doc_id {
                if *last != doc_id {
                    let mut lines = take(&mut doc_lines);
                    lines.sort_by(|a, b| natural_cmp(&a.0, &b.0));
                    file_content.push(DocumentLines {
                        doc_id: last.clone(),
                        lines,
                    });
                }
            }
            doc_lines.push((String::from(line_id), words));
            last_doc_id = Some(doc_id);
        }

        // Flush the final document.
        let last = last_doc_id.ok_or(ConvertError::EmptyInput)?;
        doc_lines.sort_by(|a, b| natural_cmp(&a.0, &b.0));
        file_content.push(DocumentLines {
            doc_id: last,
            lines: doc_lines,
        });
        Ok(file_content)
    }

    /// Labels the tokens of a single line, resolving boundary markers
    /// against a stack of currently open entities.
    fn resolve_line(&self, line: &str, line_id: &str) -> Result<Vec<TaggedToken>, ConvertError> {
        let spaced = self.punctuation.replace_all(line, " $1 ");

        let mut open_entities = Vec::new();
        let mut begin = false;
        let mut words = Vec::new();

        for word in spaced.split_whitespace() {
            let Some(captures) = self.marker.captures(word) else {
                // An ordinary token takes the most recently opened entity
                // still on the stack, or bare `O` when none is open.
                let label = match open_entities.last() {
                    Some(&kind) if begin => BioLabel::Begin(kind),
                    Some(&kind) => BioLabel::Inside(kind),
                    None => BioLabel::Outside,
                };
                words.push(TaggedToken {
                    token: String::from(word),
                    label,
                });
                begin = false;
                continue;
            };

            let name = &captures[1];
            let Some(kind) = self.config.type_map.get(name) else {
                match self.config.unknown_types {
                    UnknownTypePolicy::Fail => {
                        return Err(ConvertError::UnknownEntityType {
                            name: String::from(name),
                            line_id: String::from(line_id),
                        })
                    }
                    UnknownTypePolicy::Skip => {
                        warn!(name, line_id, "skipping marker with unknown entity type");
                        continue;
                    }
                }
            };

            if word.contains('/') {
                // Remove-if-present: a close with no matching open is
                // ignored, the transcriptions are known to contain them. The
                // removal result is discarded on purpose.
                let _ = remove_first(&mut open_entities, kind);
            } else {
                open_entities.push(kind);
                begin = true;
            }
        }
        Ok(words)
    }

    /// Writes `content` to `output`, one `token label` pair per line (with
    /// the line id prepended when configured). Returns false, creating no
    /// file, when there is no pair to write.
    pub fn write_bio_file(
        &self,
        content: &FileContent,
        output: &Path,
    ) -> Result<bool, ConvertError> {
        let pairs: Vec<(&str, &TaggedToken)> = content
            .iter()
            .flat_map(|doc| &doc.lines)
            .flat_map(|(line_id, words)| words.iter().map(move |w| (line_id.as_str(), w)))
            .collect();
        if pairs.is_empty() {
            info!(path = %output.display(), "no labeled token, skipping output file");
            return Ok(false);
        }

        let formatted: Vec<String> = if self.config.write_ids {
            pairs
                .iter()
                .map(|(line_id, w)| format!("{} {} {}", line_id, w.token, w.label))
                .collect()
        } else {
            pairs
                .iter()
                .map(|(_, w)| format!("{} {}", w.token, w.label))
                .collect()
        };
        let mut file = File::create(output)?;
        file.write_all(formatted.join("\n").as_bytes())?;
        Ok(true)
    }
}

impl Default for BioConverter {
    fn default() -> Self {
        Self::new(BioConfig::default())
    }
}

/// The document id of a line id is every dot-separated component but the
/// last, concatenated without separators. An id without a dot yields the
/// empty document id.
fn doc_id_of(line_id: &str) -> String {
    let components: Vec<&str> = line_id.split('.').collect();
    components[..components.len() - 1].concat()
}

/// Removes the first occurrence of `kind`, scanning from the bottom of the
/// stack, and reports whether anything was removed.
fn remove_first(open_entities: &mut Vec<EntityKind>, kind: EntityKind) -> bool {
    match open_entities.iter().position(|&k| k == kind) {
        Some(index) => {
            open_entities.remove(index);
            true
        }
        None => false,
    }
}
