use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Combining marks without a precomposed form stay inside the token.
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}][\p{L}\p{M}\p{N}]*").expect("valid regex");
}

/// Lazy term sequence over normalized text. Cloning restarts from the clone point.
#[derive(Debug, Clone)]
pub struct Tokens {
    text: String,
    pos: usize,
}

impl Iterator for Tokens {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mat = RE.find_at(&self.text, self.pos)?;
        self.pos = mat.end();
        Some(mat.as_str().to_string())
    }
}

/// NFKC-normalize and lowercase the whole text, then split it on non-alphanumeric
/// boundaries. No stemming and no stopword removal.
pub fn tokenize(text: &str) -> Tokens {
    Tokens { text: normalize(text), pos: 0 }
}

/// Case-fold text the same way `tokenize` folds it before splitting.
pub fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}
