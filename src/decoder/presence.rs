/// Emptiness suppression shared by bean construction and argument
/// resolution.
///
/// A result exists when the mapping declared something up front, or when at
/// least one observed slot produced a value. Otherwise the caller reports "no
/// instance" instead of materializing an object that carries no data.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Presence {
    found: bool,
}

impl Presence {
    pub(crate) fn new(declared: bool) -> Self {
        Self { found: declared }
    }

    pub(crate) fn observe(&mut self, present: bool) {
        self.found |= present;
    }

    pub(crate) fn found(self) -> bool {
        self.found
    }

    /// `Some(value)` when anything was declared or observed.
    pub(crate) fn resolve<T>(self, value: T) -> Option<T> {
        self.found.then_some(value)
    }
}
