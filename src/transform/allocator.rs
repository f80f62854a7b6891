pub type ErrorCode = u32;

/// One stripped diagnostic message and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCodeEntry {
    pub code: ErrorCode,
    /// Path relative to the scanned directory, with forward slashes.
    pub file: String,
    /// 1-based line of the call site in the file as it was read, shown by
    /// `lookup`.
    pub line: usize,
    /// Message expression exactly as written in the source.
    pub node: String,
    /// Further format arguments that were stripped together with the message.
    pub args: Vec<String>,
}

/// Run-scoped code counter and the ordered record of every allocation.
///
/// A single allocator is threaded by `&mut` through every file of a run, so
/// codes stay gap-free and follow traversal order.
#[derive(Debug, Default)]
pub struct CodeAllocator {
    last: ErrorCode,
    entries: Vec<ErrorCodeEntry>,
}

impl CodeAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next code, starting at 1.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> ErrorCode {
        self.last += 1;
        self.last
    }

    /// Appends the entry for the code most recently handed out.
    pub fn record(&mut self, entry: ErrorCodeEntry) {
        debug_assert_eq!(entry.code, self.last, "recorded code was not the last one allocated");
        debug_assert!(
            self.entries.last().is_none_or(|previous| previous.code < entry.code),
            "code {} recorded twice",
            entry.code
        );
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ErrorCodeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<ErrorCodeEntry> {
        self.entries
    }
}
