use std::cmp::Ordering;

/// A run of a name, either text (lower-cased) or an ASCII digit sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Chunk {
    Text(String),
    Number(String),
}

/// Sort key that compares embedded digit runs numerically, so `file2 < file10`.
#[derive(Debug, Clone)]
pub struct NaturalKey(Vec<Chunk>);

impl NaturalKey {
    pub fn new(name: &str) -> Self {
        let mut chunks = Vec::new();
        let mut text = String::new();
        let mut digits = String::new();

        for ch in name.chars() {
            if ch.is_ascii_digit() {
                if !text.is_empty() {
                    chunks.push(Chunk::Text(text.to_lowercase()));
                    text.clear();
                }
                digits.push(ch);
            } else {
                if !digits.is_empty() {
                    chunks.push(Chunk::Number(std::mem::take(&mut digits)));
                }
                text.push(ch);
            }
        }
        if !text.is_empty() {
            chunks.push(Chunk::Text(text.to_lowercase()));
        }
        if !digits.is_empty() {
            chunks.push(Chunk::Number(digits));
        }

        NaturalKey(chunks)
    }
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_chunks(a: &Chunk, b: &Chunk) -> Ordering {
    match (a, b) {
        (Chunk::Number(x), Chunk::Number(y)) => compare_numbers(x, y),
        (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
        // A leading number sorts before leading text.
        (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
        (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
    }
}

impl Ord for NaturalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            let ord = compare_chunks(a, b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl PartialEq for NaturalKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NaturalKey {}

impl PartialOrd for NaturalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
