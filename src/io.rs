//!
//! File formats of the inputs and outputs
//!
//! * `fasta`: the alignment
//! * `text`: topologies, matrices, weights, labels and intervals
//!
pub mod fasta;
pub mod text;

use crate::error::Result;
use flate2::bufread::GzDecoder;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;

///
/// Open a file for reading, decompressing it if the extension is `.gz`.
///
pub fn open<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    if path.as_ref().extension().map_or(false, |ext| ext == "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

///
/// write string into a file
///
pub fn write_string<P: AsRef<Path>>(path: P, string: &str) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(string.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    #[test]
    fn open_plain_and_gz() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("a.txt");
        write_string(&plain, "hello\n").unwrap();
        let mut s = String::new();
        open(&plain).unwrap().read_to_string(&mut s).unwrap();
        assert_eq!(s, "hello\n");

        let gz = dir.path().join("a.txt.gz");
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(b"hello gz\n").unwrap();
        encoder.finish().unwrap();
        let mut s = String::new();
        open(&gz).unwrap().read_to_string(&mut s).unwrap();
        assert_eq!(s, "hello gz\n");

        assert!(open(dir.path().join("missing")).is_err());
    }
}
