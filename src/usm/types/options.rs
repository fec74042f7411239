//! Options controlling how the scanner treats malformed containers.

/// Default number of bytes the scanner may step over looking for a known tag.
pub const DEFAULT_RESYNC_LIMIT: usize = 64 * 1024;

/// What to do when a block tag is not one of the recognized set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownTagPolicy {
    /// Abort the scan with `UnrecognizedTag`.
    Strict,
    /// Step forward one byte at a time until a recognized tag is found,
    /// giving up after `max_skip` bytes.
    Resync { max_skip: usize },
}

impl Default for UnknownTagPolicy {
    fn default() -> Self {
        UnknownTagPolicy::Resync {
            max_skip: DEFAULT_RESYNC_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DemuxOptions {
    pub tag_policy: UnknownTagPolicy,
}

impl DemuxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self) -> Self {
        self.tag_policy = UnknownTagPolicy::Strict;
        self
    }

    pub fn resync_limit(mut self, max_skip: usize) -> Self {
        self.tag_policy = UnknownTagPolicy::Resync { max_skip };
        self
    }
}
