use rustc_hash::FxHashMap;

/// String literals written by the program, each with a data label.
#[derive(Clone, Debug, Default)]
pub struct LiteralTable {
    labels: FxHashMap<String, String>,
    entries: Vec<(String, String)>,
}

impl LiteralTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label for `text`; a new `_S<n>` is allocated only the first time a
    /// text is seen.
    pub fn intern(&mut self, text: &str) -> String {
        if let Some(label) = self.labels.get(text) {
            return label.clone();
        }
        let label = format!("_S{}", self.entries.len());
        self.labels.insert(text.to_string(), label.clone());
        self.entries.push((label.clone(), text.to_string()));
        label
    }

    /// `(label, text)` pairs in order of first use.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, t)| (l.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
