//! Process exit codes. Part of the CLI contract; scripts match on them.
//!
//! Conversion failures carry their own code (`ConvertError::exit_code`):
//! 2 read, 3 decode, 4 write, 5 template.

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1; // Anything without a conversion error in its chain
