// Constants for the code generator

/// Number of the first label a generator hands out
pub const FIRST_LABEL: u32 = 1;

/// Number of the first temporary register a generator hands out
pub const FIRST_TEMPORARY: u32 = 1;

/// Prefix for instructions inside a function body
/// Labels are written flush left
pub const INDENT: &str = "  ";
