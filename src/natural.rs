/**
Natural ordering of line identifiers. A key such as `r1l23` is split into
alternating text and number chunks (`"r"`, `1`, `"l"`, `23`) and the number
chunks compare as integers, so `l2` sorts before `l10`.
*/
use std::cmp::Ordering;

/// Sort key for a line identifier. Build one with [`NaturalKey::from`] and
/// sort with the derived ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey(Vec<Chunk>);

/// A run of digits or a run of anything else. The derived ordering makes a
/// number chunk smaller than a text chunk when the two kinds meet at the same
/// position; inputs drawn from one id scheme alternate identically, so this
/// case only decides between unrelated schemes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    Number(u64),
    Text(String),
}

impl From<&str> for NaturalKey {
    fn from(value: &str) -> Self {
        let mut chunks = Vec::new();
        let mut buffer = String::new();
        let mut buffer_is_digits = false;
        for c in value.chars() {
            if !buffer.is_empty() && c.is_ascii_digit() != buffer_is_digits {
                chunks.push(Chunk::parse(&buffer, buffer_is_digits));
                buffer.clear();
            }
            buffer_is_digits = c.is_ascii_digit();
            buffer.push(c);
        }
        if !buffer.is_empty() {
            chunks.push(Chunk::parse(&buffer, buffer_is_digits));
        }
        NaturalKey(chunks)
    }
}

impl Chunk {
    fn parse(buffer: &str, is_digits: bool) -> Self {
        if is_digits {
            // A digit run longer than u64 would overflow; saturate instead
            // of failing the sort.
            Self::Number(buffer.parse().unwrap_or(u64::MAX))
        } else {
            Self::Text(String::from(buffer))
        }
    }
}

/// Compares two identifiers through their natural keys.
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
    NaturalKey::from(left).cmp(&NaturalKey::from(right))
}
