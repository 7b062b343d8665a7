// Identifier sequences (`VH0001`, `OWN0001`, ...)
//
// The next number is derived from the highest id already on disk, so ids
// stay unique across restarts without a separate counter file.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSequence {
    prefix: &'static str,
    next: u32,
}

impl IdSequence {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, next: 1 }
    }

    /// Continue after the highest `prefix####` id in `existing`.
    /// Ids that don't carry the prefix (e.g. UUID tokens) are ignored.
    pub fn resume<'a>(prefix: &'static str, existing: impl IntoIterator<Item = &'a str>) -> Self {
        let highest = existing
            .into_iter()
            .filter_map(|id| id.strip_prefix(prefix))
            .filter_map(|digits| digits.parse::<u32>().ok())
            .max()
            .unwrap_or(0);

        Self {
            prefix,
            next: highest + 1,
        }
    }

    pub fn peek(&self) -> String {
        format!("{}{:04}", self.prefix, self.next)
    }

    pub fn next_id(&mut self) -> String {
        let id = self.peek();
        self.next += 1;
        id
    }
}
