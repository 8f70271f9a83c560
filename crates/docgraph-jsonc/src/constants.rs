/// Line width used when no budget is configured.
pub const DEFAULT_MAX_LINE_WIDTH: usize = 80;

/// Indentation unit used when none is configured.
pub const DEFAULT_INDENT: &str = "  ";
