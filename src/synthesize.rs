use ndarray::ArrayView1;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use crate::error::RecSynthError;
use crate::file::OutputFile;
use crate::markers::in_bounds;
use crate::numeric::format_float;
use crate::simulate::HaplotypeSelectionMatrix;
use crate::vcf::VcfReader;
use crate::{Position, RateFloat};

const PROGRESS_EVERY: usize = 100_000;

/// Writes a new VCF whose haplotypes are mosaics of the input haplotypes,
/// following a [`HaplotypeSelectionMatrix`].
///
/// The input must be the VCF the markers were collected from, read with the
/// same bounds, so that the k-th record in bounds is the marker of rank k.
pub struct GenotypeSynthesizer<'a> {
    matrix: &'a HaplotypeSelectionMatrix,
    map_positions: ArrayView1<'a, RateFloat>,
    lower: Position,
    upper: Position,
}

impl<'a> GenotypeSynthesizer<'a> {
    pub fn new(
        matrix: &'a HaplotypeSelectionMatrix,
        map_positions: ArrayView1<'a, RateFloat>,
        lower: Position,
        upper: Position,
    ) -> Self {
        Self {
            matrix,
            map_positions,
            lower,
            upper,
        }
    }

    /// Read `input` and write the synthesized genotypes to `output`, naming
    /// the chromosome `contig`. Returns the number of records written.
    ///
    /// Output genotypes are phased and biallelic: a haplotype carries the
    /// alternate allele iff its source haplotype carries the first ALT allele.
    pub fn synthesize(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        contig: &str,
    ) -> Result<usize, RecSynthError> {
        let reader = VcfReader::from_path(input)?;
        let n_samples = reader.n_samples();
        if self.matrix.n_haplotypes() != 2 * n_samples {
            return Err(RecSynthError::SampleCountMismatch {
                haplotypes: self.matrix.n_haplotypes(),
                samples: n_samples,
            });
        }

        let mut writer = OutputFile::new(output).writer()?;
        write_header(&mut writer, contig, reader.samples())?;

        let exhausted = || RecSynthError::MatrixExhausted(self.matrix.n_boundaries());
        let mut timer = Instant::now();
        let mut rank = 0;
        for record in reader {
            let record = record?;
            if !in_bounds(record.pos(), self.lower, self.upper) {
                continue;
            }
            let selection = self.matrix.at_marker(rank).ok_or_else(exhausted)?;
            let map_pos = *self.map_positions.get(rank).ok_or_else(exhausted)?;

            let haplotypes = record.haplotypes(n_samples)?;
            let alt: Vec<bool> = selection
                .iter()
                .map(|&source| haplotypes[source] == Some(1))
                .collect();
            let alt_count = alt.iter().filter(|&&is_alt| is_alt).count();
            let alt_freq = if n_samples == 0 {
                0.0
            } else {
                alt_count as f64 / (2 * n_samples) as f64
            };

            write!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t.\t.\tAC={};AF={};CM={}\tGT",
                contig,
                record.pos(),
                record.id()?,
                record.reference()?,
                record.first_alt()?,
                alt_count,
                format_float(alt_freq),
                format_float(map_pos)
            )?;
            for pair in alt.chunks_exact(2) {
                write!(writer, "\t{}|{}", pair[0] as u8, pair[1] as u8)?;
            }
            writeln!(writer)?;

            rank += 1;
            if rank % PROGRESS_EVERY == 0 {
                log::info!(
                    "[ {} SNPs written ({:.2}s) ]",
                    rank,
                    timer.elapsed().as_secs_f64()
                );
                timer = Instant::now();
            }
        }
        writer.flush()?;
        Ok(rank)
    }
}

fn write_header(
    writer: &mut Box<dyn Write>,
    contig: &str,
    samples: &[String],
) -> Result<(), RecSynthError> {
    writeln!(writer, "##fileformat=VCFv4.2")?;
    writeln!(writer, "##source={}", env!("CARGO_PKG_NAME"))?;
    writeln!(writer, "##contig=<ID={}>", contig)?;
    writeln!(
        writer,
        "##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele Frequency\">"
    )?;
    writeln!(
        writer,
        "##INFO=<ID=AC,Number=1,Type=Integer,Description=\"Allele count\">"
    )?;
    writeln!(
        writer,
        "##INFO=<ID=CM,Number=A,Type=Float,Description=\"Interpolated cM position\">"
    )?;
    writeln!(
        writer,
        "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Phased genotypes\">"
    )?;
    write!(writer, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT")?;
    for sample in samples {
        write!(writer, "\t{}", sample)?;
    }
    writeln!(writer)?;
    Ok(())
}
