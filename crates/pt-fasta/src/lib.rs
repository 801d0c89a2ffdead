#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FastaError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("line {line}: sequence data before the first header")]
    MissingHeader { line: usize },
}

/// One FASTA record. `id` is the first whitespace-delimited token of the
/// header line; the remainder, if any, lands in `desc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub desc: String,
    pub seq: String,
}

impl Record {
    #[must_use]
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

pub fn read_fasta(path: impl AsRef<Path>) -> Result<Vec<Record>, FastaError> {
    let file = File::open(path)?;
    read_fasta_from(BufReader::new(file))
}

pub fn read_fasta_from<R: Read>(reader: R) -> Result<Vec<Record>, FastaError> {
    let mut records = Vec::new();
    let mut current: Option<Record> = None;

    for (line_idx, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(header) = trimmed.strip_prefix('>') {
            if let Some(record) = current.take() {
                records.push(record);
            }
            let mut parts = header.splitn(2, char::is_whitespace);
            let id = parts.next().unwrap_or_default().to_owned();
            let desc = parts.next().unwrap_or_default().trim().to_owned();
            current = Some(Record {
                id,
                desc,
                seq: String::new(),
            });
        } else {
            match current.as_mut() {
                Some(record) => record.seq.push_str(trimmed.trim()),
                None => return Err(FastaError::MissingHeader { line: line_idx + 1 }),
            }
        }
    }

    if let Some(record) = current {
        records.push(record);
    }

    Ok(records)
}

pub fn write_fasta(path: impl AsRef<Path>, records: &[Record]) -> Result<(), FastaError> {
    let file = File::create(path)?;
    write_fasta_to(file, records)
}

pub fn write_fasta_to<W: Write>(mut writer: W, records: &[Record]) -> Result<(), FastaError> {
    for record in records {
        if record.desc.is_empty() {
            writeln!(writer, ">{}", record.id)?;
        } else {
            writeln!(writer, ">{} {}", record.id, record.desc)?;
        }
        for chunk in record.seq.as_bytes().chunks(60) {
            writer.write_all(chunk)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Translate a nucleotide sequence with the standard code, stopping at the
/// first stop codon. Ambiguous or unknown codons become `X`; a trailing
/// partial codon is ignored.
#[must_use]
pub fn translate_to_stop(seq: &str) -> String {
    let bytes = seq.as_bytes();
    let mut protein = String::with_capacity(bytes.len() / 3);

    for codon in bytes.chunks_exact(3) {
        let codon: Vec<u8> = codon.iter().map(u8::to_ascii_uppercase).collect();
        let amino = codon_to_amino(&codon);
        if amino == '*' {
            break;
        }
        protein.push(amino);
    }

    protein
}

fn codon_to_amino(codon: &[u8]) -> char {
    // DNA or RNA input: U reads as T.
    let normalize = |base: u8| if base == b'U' { b'T' } else { base };
    let codon = [normalize(codon[0]), normalize(codon[1]), normalize(codon[2])];

    match &codon {
        b"TTT" | b"TTC" => 'F',
        b"TTA" | b"TTG" | b"CTT" | b"CTC" | b"CTA" | b"CTG" => 'L',
        b"ATT" | b"ATC" | b"ATA" => 'I',
        b"ATG" => 'M',
        b"GTT" | b"GTC" | b"GTA" | b"GTG" => 'V',
        b"TCT" | b"TCC" | b"TCA" | b"TCG" | b"AGT" | b"AGC" => 'S',
        b"CCT" | b"CCC" | b"CCA" | b"CCG" => 'P',
        b"ACT" | b"ACC" | b"ACA" | b"ACG" => 'T',
        b"GCT" | b"GCC" | b"GCA" | b"GCG" => 'A',
        b"TAT" | b"TAC" => 'Y',
        b"TAA" | b"TAG" | b"TGA" => '*',
        b"CAT" | b"CAC" => 'H',
        b"CAA" | b"CAG" => 'Q',
        b"AAT" | b"AAC" => 'N',
        b"AAA" | b"AAG" => 'K',
        b"GAT" | b"GAC" => 'D',
        b"GAA" | b"GAG" => 'E',
        b"TGT" | b"TGC" => 'C',
        b"TGG" => 'W',
        b"CGT" | b"CGC" | b"CGA" | b"CGG" | b"AGA" | b"AGG" => 'R',
        b"GGT" | b"GGC" | b"GGA" | b"GGG" => 'G',
        _ => 'X',
    }
}

#[cfg(test)]
mod tests {
    use super::{FastaError, Record, read_fasta_from, translate_to_stop, write_fasta_to};

    #[test]
    fn reads_multiline_records_with_descriptions() {
        let input = ">g1 some contig\nATGAAA\nTGA\n>g2\nATG\n";
        let records = read_fasta_from(input.as_bytes()).expect("read");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "g1");
        assert_eq!(records[0].desc, "some contig");
        assert_eq!(records[0].seq, "ATGAAATGA");
        assert_eq!(records[1].len(), 3);
    }

    #[test]
    fn sequence_before_header_fails() {
        let err = read_fasta_from("ATG\n".as_bytes()).expect_err("must fail");
        assert!(matches!(err, FastaError::MissingHeader { line: 1 }));
    }

    #[test]
    fn translation_stops_at_first_stop_codon() {
        assert_eq!(translate_to_stop("ATGAAATGAATG"), "MK");
        assert_eq!(translate_to_stop("ATGNNTAAA"), "MXK");
        // Trailing partial codon is dropped.
        assert_eq!(translate_to_stop("ATGAA"), "M");
    }

    #[test]
    fn writer_wraps_long_sequences() {
        let record = Record {
            id: "g1".to_owned(),
            desc: String::new(),
            seq: "A".repeat(70),
        };
        let mut out = Vec::new();
        write_fasta_to(&mut out, &[record]).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, format!(">g1\n{}\n{}\n", "A".repeat(60), "A".repeat(10)));
    }

    #[test]
    fn round_trip_preserves_ids_and_sequences() {
        let input = ">c1\nACGT\n>c2 plasmid\nGGGG\n";
        let records = read_fasta_from(input.as_bytes()).expect("read");
        let mut out = Vec::new();
        write_fasta_to(&mut out, &records).expect("write");
        let back = read_fasta_from(out.as_slice()).expect("reread");
        assert_eq!(records, back);
    }
}
