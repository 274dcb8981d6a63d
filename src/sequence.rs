//! Sequence Utilities
//!
//! Nucleotide and protein helpers exposed to plugin executors through the
//! execution context. All functions are case-insensitive on input and ignore
//! whitespace, so sequences pasted from FASTA blocks can be used directly.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// Amino acids typically encoded by hydrophobic residues
const HYDROPHOBIC: &[char] = &['A', 'V', 'I', 'L', 'M', 'F', 'W', 'Y'];
/// Charged residues
const CHARGED: &[char] = &['R', 'K', 'D', 'E'];
/// Polar residues
const POLAR: &[char] = &['N', 'Q', 'S', 'T', 'Y'];

/// Normalise a sequence: strip whitespace, uppercase
pub fn normalise(sequence: &str) -> String {
    sequence
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// GC content as a percentage of all bases (0.0 for an empty sequence)
pub fn gc_content(sequence: &str) -> f64 {
    let seq = normalise(sequence);
    if seq.is_empty() {
        return 0.0;
    }
    let gc = seq.chars().filter(|c| matches!(c, 'G' | 'C' | 'S')).count();
    gc as f64 / seq.chars().count() as f64 * 100.0
}

/// Complement of a single IUPAC nucleotide code; unknown symbols map to `N`
pub fn complement(base: char) -> char {
    match base.to_ascii_uppercase() {
        'A' => 'T',
        'T' | 'U' => 'A',
        'G' => 'C',
        'C' => 'G',
        'R' => 'Y',
        'Y' => 'R',
        'S' => 'S',
        'W' => 'W',
        'K' => 'M',
        'M' => 'K',
        'B' => 'V',
        'V' => 'B',
        'D' => 'H',
        'H' => 'D',
        _ => 'N',
    }
}

/// Reverse complement of a DNA sequence
pub fn reverse_complement(sequence: &str) -> String {
    normalise(sequence).chars().rev().map(complement).collect()
}

/// Translate a codon using the standard genetic code (`*` marks stop codons)
pub fn translate_codon(codon: &str) -> Option<char> {
    let aa = match codon {
        "TTT" | "TTC" => 'F',
        "TTA" | "TTG" | "CTT" | "CTC" | "CTA" | "CTG" => 'L',
        "TCT" | "TCC" | "TCA" | "TCG" | "AGT" | "AGC" => 'S',
        "TAT" | "TAC" => 'Y',
        "TAA" | "TAG" | "TGA" => '*',
        "TGT" | "TGC" => 'C',
        "TGG" => 'W',
        "CCT" | "CCC" | "CCA" | "CCG" => 'P',
        "CAT" | "CAC" => 'H',
        "CAA" | "CAG" => 'Q',
        "CGT" | "CGC" | "CGA" | "CGG" | "AGA" | "AGG" => 'R',
        "ATT" | "ATC" | "ATA" => 'I',
        "ATG" => 'M',
        "ACT" | "ACC" | "ACA" | "ACG" => 'T',
        "AAT" | "AAC" => 'N',
        "AAA" | "AAG" => 'K',
        "GTT" | "GTC" | "GTA" | "GTG" => 'V',
        "GCT" | "GCC" | "GCA" | "GCG" => 'A',
        "GAT" | "GAC" => 'D',
        "GAA" | "GAG" => 'E',
        "GGT" | "GGC" | "GGA" | "GGG" => 'G',
        _ => return None,
    };
    Some(aa)
}

/// Split a sequence into complete codons, RNA `U` read as `T`
fn codons(sequence: &str) -> Vec<String> {
    let seq: Vec<char> = normalise(sequence)
        .chars()
        .map(|c| if c == 'U' { 'T' } else { c })
        .collect();
    seq.chunks_exact(3).map(|chunk| chunk.iter().collect()).collect()
}

/// Translate a coding sequence. Trailing partial codons are ignored and
/// ambiguous codons translate to `X`. When `to_stop` is set translation ends
/// at the first stop codon (which is not included).
pub fn translate(sequence: &str, to_stop: bool) -> String {
    let mut protein = String::new();
    for codon in codons(sequence) {
        let aa = translate_codon(&codon).unwrap_or('X');
        if aa == '*' && to_stop {
            break;
        }
        protein.push(aa);
    }
    protein
}

/// Count occurrences of each complete codon
pub fn codon_counts(sequence: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for codon in codons(sequence) {
        *counts.entry(codon).or_insert(0) += 1;
    }
    counts
}

/// Usage of a single codon relative to its synonymous codons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodonUsage {
    pub codon: String,
    pub amino_acid: char,
    pub count: usize,
    /// Fraction of this amino acid's codons that used this codon
    pub fraction: f64,
}

/// Relative synonymous codon usage for a coding sequence
pub fn codon_usage(sequence: &str) -> Vec<CodonUsage> {
    let counts = codon_counts(sequence);
    let mut per_amino_acid: BTreeMap<char, usize> = BTreeMap::new();
    for (codon, count) in &counts {
        if let Some(aa) = translate_codon(codon) {
            *per_amino_acid.entry(aa).or_insert(0) += count;
        }
    }

    counts
        .into_iter()
        .filter_map(|(codon, count)| {
            let aa = translate_codon(&codon)?;
            let total = per_amino_acid.get(&aa).copied().unwrap_or(0);
            Some(CodonUsage {
                fraction: if total == 0 { 0.0 } else { count as f64 / total as f64 },
                amino_acid: aa,
                codon,
                count,
            })
        })
        .collect()
}

/// Count and percentage of one residue in a protein
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidueCount {
    pub count: usize,
    pub percentage: f64,
}

/// Amino acid composition of a protein sequence
pub fn amino_acid_composition(protein: &str) -> BTreeMap<char, ResidueCount> {
    let seq = normalise(protein);
    let total = seq.chars().count();
    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    for aa in seq.chars() {
        *counts.entry(aa).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(aa, count)| {
            let percentage = if total == 0 { 0.0 } else { count as f64 / total as f64 * 100.0 };
            (aa, ResidueCount { count, percentage })
        })
        .collect()
}

/// Physico-chemical residue classes of a protein
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidueClasses {
    pub length: usize,
    pub hydrophobic: ResidueCount,
    pub charged: ResidueCount,
    pub polar: ResidueCount,
}

/// Summarise hydrophobic, charged and polar residues
pub fn residue_classes(protein: &str) -> ResidueClasses {
    let seq = normalise(protein);
    let length = seq.chars().count();
    let class_count = |members: &[char]| {
        let count = seq.chars().filter(|c| members.contains(c)).count();
        let percentage = if length == 0 { 0.0 } else { count as f64 / length as f64 * 100.0 };
        ResidueCount { count, percentage }
    };
    ResidueClasses {
        length,
        hydrophobic: class_count(HYDROPHOBIC),
        charged: class_count(CHARGED),
        polar: class_count(POLAR),
    }
}
