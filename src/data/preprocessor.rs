// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Turns raw corpus text into sentences of canonical words.
//
// Cleaning (applied in order):
//   1. Replace Unicode whitespace variants with plain space
//   2. Replace \r with \n for consistent line endings
//   3. Remove invisible control characters
//   4. Collapse multiple spaces and trim each line
//
// Canonicalisation of each non-empty line:
//   - lowercase
//   - punctuation becomes its own token ("end." → "end", ".")
//   - every run of digits becomes the token DG ("1999" → "DG")
//
// One line is one sentence.
//
// Reference: Rust Book §8 (Strings in Rust)
//            Rust Book §13 (Iterators)

/// Token every run of ASCII digits is replaced with.
pub const DIGIT_TOKEN: &str = "DG";

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Normalise whitespace and control characters, one cleaned line per
    /// input line, with blank lines removed.
    pub fn clean(&self, text: &str) -> String {
        let normalised: String = text
            .chars()
            .map(|c| match c {
                '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                '\r' => '\n',
                c if c.is_control() && c != '\n' => ' ',
                c => c,
            })
            .collect();

        normalised
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Split cleaned text into sentences of canonical words.
    pub fn sentences(&self, text: &str) -> Vec<Vec<String>> {
        self.clean(text)
            .lines()
            .map(|line| self.canonical_words(line))
            .filter(|words| !words.is_empty())
            .collect()
    }

    /// Canonical word sequence of one line.
    pub fn canonical_words(&self, line: &str) -> Vec<String> {
        let mut words = Vec::new();
        for raw in line.split_whitespace() {
            let mut current = String::new();
            let mut in_digits = false;

            for c in raw.chars() {
                if c.is_ascii_digit() {
                    if !in_digits {
                        flush(&mut current, &mut words);
                        words.push(DIGIT_TOKEN.to_string());
                        in_digits = true;
                    }
                    continue;
                }
                in_digits = false;

                if c.is_alphanumeric() || c == '\'' {
                    current.extend(c.to_lowercase());
                } else {
                    flush(&mut current, &mut words);
                    words.push(c.to_string());
                }
            }
            flush(&mut current, &mut words);
        }
        words
    }
}

fn flush(current: &mut String, words: &mut Vec<String>) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
