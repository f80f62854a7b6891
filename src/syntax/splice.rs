use std::ops::Range;

/// Replacement text keyed by the byte range of the source it covers.
///
/// Ranges come from tree spans, so two edits are either disjoint or one
/// covers the other. A covering edit is built from text that already
/// contains the edits it covers, which are dropped when it is added.
#[derive(Debug, Clone)]
pub struct Splices<'a> {
    source: &'a str,
    edits: Vec<(Range<usize>, String)>,
}

impl<'a> Splices<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn replace(&mut self, range: Range<usize>, text: String) {
        self.edits
            .retain(|(edit, _)| !(range.start <= edit.start && edit.end <= range.end));
        let at = self.edits.partition_point(|(edit, _)| edit.start < range.start);
        self.edits.insert(at, (range, text));
    }

    /// `range` of the source with every edit inside it applied.
    pub fn render(&self, range: Range<usize>) -> String {
        let mut out = String::with_capacity(range.len());
        let mut cursor = range.start;
        let first = self.edits.partition_point(|(edit, _)| edit.start < range.start);
        for (edit, text) in &self.edits[first..] {
            if edit.end > range.end {
                break;
            }
            out.push_str(&self.source[cursor..edit.start]);
            out.push_str(text);
            cursor = edit.end;
        }
        out.push_str(&self.source[cursor..range.end]);
        out
    }

    /// The whole source with all edits applied.
    pub fn finish(self) -> String {
        if self.edits.is_empty() {
            return self.source.to_string();
        }
        self.render(0..self.source.len())
    }
}
