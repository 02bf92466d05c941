use crate::errors::CliError;
use miette::Result;
use std::fs;
use std::path::Path;

#[macro_export]
macro_rules! println_pad {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        for __line in __s.lines() {
            println!("    {}", __line);
        }
    }};
}

/// Read a pack file, mapping a missing file to a friendly diagnostic.
pub fn read_pack_file(file_path: &str) -> Result<String> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(CliError::file_not_found(path.to_path_buf()).into());
    }
    fs::read_to_string(path).map_err(|e| CliError::from(e).into())
}
