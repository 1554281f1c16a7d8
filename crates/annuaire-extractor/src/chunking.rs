//! Splitting large inputs into model-sized chunks
//!
//! Sizes are counted in characters. Chunk order follows the input, so
//! records extracted chunk by chunk keep document order.

use crate::config::ChunkStrategy;
use serde_json::Value;

/// Chunks text according to the specified strategy
pub struct TextChunker {
    strategy: ChunkStrategy,
    max_chunk_size: usize,
}

impl TextChunker {
    /// Create a new text chunker
    pub fn new(strategy: ChunkStrategy, max_chunk_size: usize) -> Self {
        Self {
            strategy,
            max_chunk_size: max_chunk_size.max(1),
        }
    }

    /// Chunk the given text
    ///
    /// A JSON array (the tabular form produced from uploaded CSV files) is
    /// split between rows and each chunk is itself a JSON array; a row is
    /// never cut. Anything else is split by the configured strategy.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if char_len(text) <= self.max_chunk_size {
            return vec![text.to_string()];
        }

        if let Some(rows) = tabular_rows(text) {
            return self.chunk_rows(rows);
        }

        let pieces = match self.strategy {
            ChunkStrategy::ByParagraph => paragraphs(text),
            ChunkStrategy::BySection => {
                let found = sections(text);
                if found.len() > 1 {
                    found
                } else {
                    paragraphs(text)
                }
            }
            ChunkStrategy::BySentence => sentences(text),
        };
        let separator = match self.strategy {
            ChunkStrategy::BySentence => " ",
            _ => "\n\n",
        };
        self.pack(pieces, separator)
    }

    fn chunk_rows(&self, rows: Vec<Value>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<Value> = Vec::new();
        let mut current_len = 2;

        for row in rows {
            let row_len = char_len(&row.to_string()) + 1;
            if !current.is_empty() && current_len + row_len > self.max_chunk_size {
                chunks.push(Value::Array(std::mem::take(&mut current)).to_string());
                current_len = 2;
            }
            current_len += row_len;
            current.push(row);
        }
        if !current.is_empty() {
            chunks.push(Value::Array(current).to_string());
        }
        chunks
    }

    /// Greedily join pieces up to the size limit, hard-splitting any piece
    /// that is too large on its own
    fn pack(&self, pieces: Vec<String>, separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for piece in pieces {
            let piece_len = char_len(&piece);
            let needed = if current.is_empty() { piece_len } else { current_len + sep_len + piece_len };

            if needed <= self.max_chunk_size {
                if !current.is_empty() {
                    current.push_str(separator);
                }
                current.push_str(&piece);
                current_len = needed;
                continue;
            }

            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if piece_len > self.max_chunk_size {
                chunks.extend(hard_split(&piece, self.max_chunk_size));
            } else {
                current_len = piece_len;
                current = piece;
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn tabular_rows(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Array(rows)) => Some(rows),
        _ => None,
    }
}

fn paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_heading(line: &str) -> bool {
    let line = line.trim_start();
    if line.starts_with('#') {
        return true;
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && line[digits..].starts_with(['.', ')'])
}

fn sections(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if is_heading(line) && !current.trim().is_empty() {
            found.push(current.trim().to_string());
            current.clear();
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        found.push(current.trim().to_string());
    }
    found
}

fn sentences(text: &str) -> Vec<String> {
    text.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn hard_split(text: &str, limit: usize) -> Vec<String> {
    text.chars()
        .collect::<Vec<_>>()
        .chunks(limit)
        .map(|c| c.iter().collect())
        .collect()
}
