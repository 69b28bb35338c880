//! Title-aware chunking of partitioned elements

use unicode_segmentation::UnicodeSegmentation;

use super::Element;

/// Separator between element texts inside a chunk
const ELEMENT_SEPARATOR: &str = "\n\n";

/// Groups partition elements into sections that start at titles.
///
/// No chunk exceeds `max_characters`; oversized elements are split at
/// sentence boundaries (and hard-split if one sentence is too long).
/// Consecutive sections are merged while the accumulated chunk is shorter
/// than `combine_text_under_n_chars` and the result still fits.
#[derive(Debug, Clone, Copy)]
pub struct TitleChunker {
    max_characters: usize,
    combine_text_under_n_chars: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Title,
    Table,
    Text,
}

impl Kind {
    fn of(element_type: &str) -> Self {
        match element_type {
            "Title" => Kind::Title,
            "Table" => Kind::Table,
            _ => Kind::Text,
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

impl TitleChunker {
    pub fn new(max_characters: usize, combine_text_under_n_chars: usize) -> Self {
        Self {
            max_characters: max_characters.max(1),
            combine_text_under_n_chars: combine_text_under_n_chars.min(max_characters),
        }
    }

    pub fn max_characters(&self) -> usize {
        self.max_characters
    }

    /// Chunk element texts in order. Blank elements are ignored.
    pub fn chunk(&self, elements: &[Element]) -> Vec<String> {
        let sections = self.sections(elements);
        self.combine(sections)
    }

    fn sections(&self, elements: &[Element]) -> Vec<(Kind, String)> {
        let mut sections: Vec<(Kind, String)> = Vec::new();
        let mut current = String::new();

        for element in elements {
            let text = element.text.trim();
            if text.is_empty() {
                continue;
            }
            let kind = Kind::of(&element.element_type);

            if kind != Kind::Text && !current.is_empty() {
                sections.push((Kind::Text, std::mem::take(&mut current)));
            }

            for piece in self.split_oversized(text) {
                if kind == Kind::Table {
                    sections.push((Kind::Table, piece));
                    continue;
                }
                if !current.is_empty()
                    && char_len(&current) + ELEMENT_SEPARATOR.len() + char_len(&piece)
                        > self.max_characters
                {
                    sections.push((Kind::Text, std::mem::take(&mut current)));
                }
                if !current.is_empty() {
                    current.push_str(ELEMENT_SEPARATOR);
                }
                current.push_str(&piece);
            }
        }

        if !current.is_empty() {
            sections.push((Kind::Text, current));
        }

        sections
    }

    fn combine(&self, sections: Vec<(Kind, String)>) -> Vec<String> {
        let mut chunks: Vec<(Kind, String)> = Vec::new();

        for (kind, text) in sections {
            if let Some((last_kind, last)) = chunks.last_mut() {
                let last_len = char_len(last);
                let fits = last_len + ELEMENT_SEPARATOR.len() + char_len(&text) <= self.max_characters;
                let mergeable = *last_kind != Kind::Table && kind != Kind::Table;
                if mergeable && fits && last_len < self.combine_text_under_n_chars {
                    last.push_str(ELEMENT_SEPARATOR);
                    last.push_str(&text);
                    continue;
                }
            }
            chunks.push((kind, text));
        }

        chunks.into_iter().map(|(_, text)| text).collect()
    }

    /// Split text longer than the limit, preferring sentence boundaries.
    fn split_oversized(&self, text: &str) -> Vec<String> {
        if char_len(text) <= self.max_characters {
            return vec![text.to_string()];
        }

        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for sentence in text.split_sentence_bounds() {
            let sentence_len = char_len(sentence);

            if current_len + sentence_len > self.max_characters && !current.is_empty() {
                pieces.push(current.trim().to_string());
                current.clear();
                current_len = 0;
            }

            if sentence_len > self.max_characters {
                for piece in self.hard_split(sentence) {
                    pieces.push(piece);
                }
                continue;
            }

            current.push_str(sentence);
            current_len += sentence_len;
        }

        if !current.trim().is_empty() {
            pieces.push(current.trim().to_string());
        }

        pieces.retain(|p| !p.is_empty());
        pieces
    }

    fn hard_split(&self, text: &str) -> Vec<String> {
        let graphemes: Vec<&str> = text.graphemes(true).collect();
        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for g in graphemes {
            let g_len = char_len(g);
            if current_len + g_len > self.max_characters && !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push_str(g);
            current_len += g_len;
        }
        if !current.is_empty() {
            pieces.push(current);
        }

        pieces
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }
}
