//!
//! Alignment in (optionally gzipped) FASTA
//!
use crate::alignment::{Alignment, Sequence};
use crate::error::{PhyloHmmError, Result};
use bio::io::fasta;
use log::info;
use std::path::Path;

///
/// `(id, sequence)` of every record, in the file order
///
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<(String, Sequence)>> {
    let reader = fasta::Reader::new(super::open(path)?);
    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        record
            .check()
            .map_err(|message| PhyloHmmError::Parse(format!("{}: {}", record.id(), message)))?;
        records.push((record.id().to_string(), record.seq().to_vec()));
    }
    Ok(records)
}

///
/// Read an alignment. The `j`-th record is the sequence `j` of the tree
/// topologies.
///
pub fn read_alignment<P: AsRef<Path>>(path: P) -> Result<Alignment> {
    let records = read_records(path.as_ref())?;
    let seqs: Vec<Sequence> = records.into_iter().map(|(_, seq)| seq).collect();
    let alignment = Alignment::from_seqs(&seqs)?;
    info!(
        "read {} sequences x {} columns from {}",
        alignment.n_seqs(),
        alignment.n_columns(),
        path.as_ref().display()
    );
    Ok(alignment)
}

///
/// Write an alignment with ids `seq0`, `seq1`, ...
///
pub fn write_alignment<P: AsRef<Path>>(path: P, alignment: &Alignment) -> Result<()> {
    let mut writer = fasta::Writer::to_file(path)?;
    for (j, seq) in alignment.to_seqs().iter().enumerate() {
        writer.write(&format!("seq{}", j), None, seq)?;
    }
    writer.flush()?;
    Ok(())
}
