//! Common regex patterns for cell typing and file naming.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Plain or scientific decimal number, optionally signed
    pub static ref NUMBER: Regex = Regex::new(
        r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?$"
    ).unwrap();

    // Characters replaced by '-' in crop file names
    pub static ref PATH_SEPARATORS: Regex = Regex::new(r"[/\\]").unwrap();

    // Characters replaced by '_' in crop file names
    pub static ref UNSAFE_FILE_CHARS: Regex = Regex::new(r#"[(),:*?"<>|]"#).unwrap();
}
