#[cfg(test)]
mod tests;

use itertools::Itertools;
use scraper::{Html, Node};
use ego_tree::NodeRef;
use tracing::debug;

/// A chunk of page content tagged with the heading hierarchy active at the
/// point it was extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Whitespace-normalized text content of this segment.
    pub text: String,
    /// Ordered (label, heading text) pairs from the outermost heading
    /// inward. Empty when no configured heading has appeared yet.
    pub heading_path: Vec<(String, String)>,
}

impl Chunk {
    /// Look up the heading text recorded under a metadata label.
    #[inline]
    pub fn heading(&self, label: &str) -> Option<&str> {
        self.heading_path
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, text)| text.as_str())
    }
}

/// Configuration for header-aware chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Maximum chunk size in characters before forced subdivision.
    pub max_chunk_size: usize,
    /// Character overlap inserted between adjacent sub-chunks when an
    /// oversized chunk is subdivided. Clamped to 10% of `max_chunk_size`.
    pub chunk_overlap: usize,
    /// Which heading tags participate in chunk boundaries and the metadata
    /// label each is reported under. List order defines the level ranking,
    /// outermost first.
    pub headers_to_split_on: Vec<(String, String)>,
}

impl Default for ChunkerConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_chunk_size: 500,
            chunk_overlap: 30,
            headers_to_split_on: default_headers(),
        }
    }
}

/// The default heading spec: `h1..h5` labeled `"Header 1".."Header 5"`.
#[inline]
pub fn default_headers() -> Vec<(String, String)> {
    (1..=5)
        .map(|level| (format!("h{}", level), format!("Header {}", level)))
        .collect()
}

/// Split an HTML document into header-tagged chunks.
///
/// Walks the document tree in document order, accumulating text into the
/// current chunk and flushing it whenever a configured heading appears. Each
/// flushed chunk carries the chain of ancestor headings that was open before
/// the flush. Heading text only ever contributes to `heading_path`, never to
/// chunk bodies. Malformed markup degrades to best-effort text extraction;
/// this function never fails.
#[inline]
pub fn chunk(html: &str, config: &ChunkerConfig) -> Vec<Chunk> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let document = Html::parse_document(html);

    let mut state = SplitState::new(config);
    walk(*document.root_element(), &mut state);
    let chunks = state.finish();

    debug!(
        "Split {} bytes of HTML into {} chunks",
        html.len(),
        chunks.len()
    );

    enforce_max_size(chunks, config.max_chunk_size, config.chunk_overlap)
}

/// Tags whose subtrees never contribute visible text.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Traversal state for a single chunking pass: the open-heading stack and
/// the text buffer for the chunk currently being accumulated.
struct SplitState<'a> {
    headers: &'a [(String, String)],
    /// Currently open headings as (level, heading text), strictly increasing
    /// by level from outer to inner.
    heading_stack: Vec<(usize, String)>,
    buffer: String,
    chunks: Vec<Chunk>,
}

impl<'a> SplitState<'a> {
    fn new(config: &'a ChunkerConfig) -> Self {
        Self {
            headers: &config.headers_to_split_on,
            heading_stack: Vec::new(),
            buffer: String::new(),
            chunks: Vec::new(),
        }
    }

    /// The level rank of a tag in the heading spec, if it participates.
    fn heading_level(&self, tag: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(tag))
    }

    fn push_text(&mut self, text: &str) {
        let normalized = normalize_whitespace(text);
        if normalized.is_empty() {
            return;
        }
        if !self.buffer.is_empty() {
            self.buffer.push(' ');
        }
        self.buffer.push_str(&normalized);
    }

    /// Flush the pending buffer under the pre-heading stack, then open the
    /// new heading: entries at or below its level are purged first.
    fn open_heading(&mut self, level: usize, text: String) {
        self.flush_buffer();
        self.heading_stack.retain(|(l, _)| *l < level);
        if !text.is_empty() {
            self.heading_stack.push((level, text));
        }
    }

    // Empty buffers never emit a chunk here, so a document opening with a
    // heading produces no pre-heading state; heading-only trailing states
    // are registered once in finish().
    fn flush_buffer(&mut self) {
        if self.buffer.trim().is_empty() {
            self.buffer.clear();
            return;
        }
        let chunk = Chunk {
            text: std::mem::take(&mut self.buffer),
            heading_path: self.current_path(),
        };
        self.chunks.push(chunk);
    }

    fn current_path(&self) -> Vec<(String, String)> {
        self.heading_stack
            .iter()
            .map(|(level, text)| (self.headers[*level].1.clone(), text.clone()))
            .collect()
    }

    /// Final flush at end of document. A trailing heading with no body text
    /// still registers its metadata state, but exactly once.
    fn finish(mut self) -> Vec<Chunk> {
        if !self.buffer.trim().is_empty() {
            self.flush_buffer();
        } else if !self.heading_stack.is_empty() {
            let path = self.current_path();
            if self.chunks.last().map(|c| &c.heading_path) != Some(&path) {
                self.chunks.push(Chunk {
                    text: String::new(),
                    heading_path: path,
                });
            }
        }
        self.chunks
    }
}

/// Pre-order walk over the node tree, feeding text and heading events into
/// the split state. Heading subtrees are consumed whole and not descended
/// into, so their text lands in the path rather than the body.
fn walk(node: NodeRef<'_, Node>, state: &mut SplitState<'_>) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => state.push_text(&text),
            Node::Element(element) => {
                let tag = element.name();
                if SKIPPED_TAGS.contains(&tag) {
                    continue;
                }
                if let Some(level) = state.heading_level(tag) {
                    let heading_text = collect_text(child);
                    state.open_heading(level, heading_text);
                } else {
                    walk(child, state);
                }
            }
            _ => {}
        }
    }
}

/// Concatenate all descendant text of a node, whitespace-normalized.
fn collect_text(node: NodeRef<'_, Node>) -> String {
    node.descendants()
        .filter_map(|n| match n.value() {
            Node::Text(text) => {
                let normalized = normalize_whitespace(&text);
                (!normalized.is_empty()).then_some(normalized)
            }
            _ => None,
        })
        .join(" ")
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}

/// Subdivide any chunk longer than `max_chunk_size` characters at natural
/// text boundaries, replicating its heading path onto every sub-chunk and
/// prefixing a small overlap onto each sub-chunk after the first. Chunks
/// already within bound pass through untouched.
fn enforce_max_size(chunks: Vec<Chunk>, max_chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    if max_chunk_size == 0 {
        return chunks;
    }
    let overlap = overlap.min(max_chunk_size / 10);

    let mut out = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if chunk.text.chars().count() <= max_chunk_size {
            out.push(chunk);
            continue;
        }

        // Reserve room for the overlap prefix so sub-chunks stay in bound.
        let budget = max_chunk_size
            .saturating_sub(overlap + usize::from(overlap > 0))
            .max(1);
        let pieces = split_text(&chunk.text, budget);
        debug!(
            "Subdividing oversized chunk ({} chars) into {} pieces",
            chunk.text.chars().count(),
            pieces.len()
        );

        let mut previous_tail = String::new();
        for (i, piece) in pieces.into_iter().enumerate() {
            let text = if i > 0 && !previous_tail.is_empty() {
                format!("{} {}", previous_tail, piece)
            } else {
                piece.clone()
            };
            previous_tail = tail_chars(&piece, overlap);
            out.push(Chunk {
                text,
                heading_path: chunk.heading_path.clone(),
            });
        }
    }
    out
}

/// Greedily pack atomic units (sentences, falling back to words, then raw
/// character runs) into pieces of at most `max` characters.
fn split_text(text: &str, max: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for unit in atomic_units(text, max) {
        let unit_len = unit.chars().count();
        if current.is_empty() {
            current = unit;
            current_len = unit_len;
        } else if current_len + 1 + unit_len <= max {
            current.push(' ');
            current.push_str(&unit);
            current_len += 1 + unit_len;
        } else {
            pieces.push(std::mem::take(&mut current));
            current = unit;
            current_len = unit_len;
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Break text into units no longer than `max` characters, preferring
/// sentence boundaries, then word boundaries, then hard character cuts.
fn atomic_units(text: &str, max: usize) -> Vec<String> {
    let mut units = Vec::new();
    for sentence in split_sentences(text) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        if sentence.chars().count() <= max {
            units.push(sentence.to_string());
            continue;
        }
        for word in sentence.split_whitespace() {
            if word.chars().count() <= max {
                units.push(word.to_string());
            } else {
                let chars: Vec<char> = word.chars().collect();
                for run in chars.chunks(max) {
                    units.push(run.iter().collect());
                }
            }
        }
    }
    units
}

/// Split on sentence terminators, keeping the terminator with its sentence.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }
    sentences
}

/// The last `n` characters of a string, cut at a char boundary.
fn tail_chars(text: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let chars: Vec<char> = text.chars().collect();
    let start = chars.len().saturating_sub(n);
    chars[start..].iter().collect()
}
