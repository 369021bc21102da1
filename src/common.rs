//! Shared option types passed from the CLI into command handlers.

/// Per-command behavior switches.
#[derive(Debug, Clone, Copy)]
pub struct CmdOptions {
    /// Expand patterns that name a directory to the whole subtree.
    pub recurse: bool,
    /// Treat MacZip paired metadata headers as part of their data sibling.
    pub mac_zip: bool,
}

impl Default for CmdOptions {
    fn default() -> Self {
        Self {
            recurse: true,
            mac_zip: true,
        }
    }
}
