//! XMF File Loader
//!
//! Reads XMF containers from disk and extracts their playable resources.

use std::fs;
use std::path::Path;

use log::debug;

use crate::config::ParserConfig;
use crate::format::XmfSong;
use crate::parser::parse_container_with;
use crate::Result;

/// Load an XMF file from disk with the default configuration.
pub fn load_file(path: impl AsRef<Path>) -> Result<XmfSong> {
    load_file_with(path, &ParserConfig::default())
}

/// Load an XMF file from disk.
pub fn load_file_with(path: impl AsRef<Path>, config: &ParserConfig) -> Result<XmfSong> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    debug!("Read {} bytes from {}", data.len(), path.display());
    parse_container_with(&data, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::XmfError;

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(dir.path().join("missing.xmf")).unwrap_err();
        assert!(matches!(err, XmfError::Io(_)));
    }

    #[test]
    fn test_non_xmf_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"MThd\x00\x00\x00\x06").unwrap();
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err, XmfError::InvalidHeader { .. }));
    }
}
