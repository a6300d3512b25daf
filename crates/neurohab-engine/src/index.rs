// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Input file indexing
//!
//! Resolves a flat set of per-block image files into a keyed
//! (condition, region, subject) grid ordered by block-within-condition.
//!
//! Files are matched by substring containment of three independently
//! zero-padded tokens — `Subject<NNN>`, `Condition<NNN>` (1-based block
//! position in the design sequence), `Source<NNN>` (region) — and a file must
//! contain all three to be selected. The keyed grid replaces positional
//! nesting: a cell's key *is* its output label, so input and output ordering
//! cannot drift apart.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{EngineError, EngineResult};

/// Fixed file-name prefix of candidate input volumes
pub const CANDIDATE_PREFIX: &str = "BETA";

/// Form a zero-padded file-name token, e.g. `token("Subject", 7, 3)` is
/// `"Subject007"`. Padding never truncates: IDs wider than `pad` keep all
/// their digits.
pub fn token(prefix: &str, id: u32, pad: usize) -> String {
    format!("{}{:0width$}", prefix, id, width = pad)
}

/// List candidate input files: regular directory entries whose name starts
/// with [`CANDIDATE_PREFIX`], sorted for determinism.
pub fn scan_input_dir(dir: &Path) -> EngineResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| EngineError::Scan {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| EngineError::Scan {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(CANDIDATE_PREFIX) {
            files.push(entry.path());
        }
    }
    files.sort();
    debug!(dir = %dir.display(), count = files.len(), "scanned input directory");
    Ok(files)
}

/// The resolved subject × condition × region grid of input files.
///
/// Unique conditions are deduplicated from the design sequence and iterated
/// in ascending numeric order; the same order labels the output files.
/// Within a condition, blocks keep their design-sequence order.
#[derive(Debug, Clone)]
pub struct FileIndex {
    /// (condition, region, subject) -> per-block (design position, match).
    /// Unmatched blocks are kept as `None`: the index itself is permissive
    /// and only its consumers fail on unresolved cells.
    cells: BTreeMap<(u32, u32, u32), Vec<(u32, Option<PathBuf>)>>,
    conditions: Vec<u32>,
    regions: Vec<u32>,
    subjects: Vec<u32>,
    pad: usize,
}

impl FileIndex {
    /// Build the index from a candidate file listing and the study design.
    ///
    /// # Arguments
    /// * `files` - candidate input paths (see [`scan_input_dir`])
    /// * `design` - condition label of each block, in design-sequence order
    /// * `regions` - seed/ROI numbers
    /// * `subjects` - subject numbers
    /// * `pad` - zero-pad width for all three token families
    ///
    /// A block matching more than one file keeps the first match (sorted
    /// path order) and logs a warning; a block matching none is stored
    /// empty and reported by [`FileIndex::resolved_cell`] when consumed.
    pub fn build(
        files: &[PathBuf],
        design: &[u32],
        regions: &[u32],
        subjects: &[u32],
        pad: usize,
    ) -> Self {
        let conditions: Vec<u32> = design.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();

        let file_names: Vec<(String, &PathBuf)> = files
            .iter()
            .map(|p| {
                let name = p
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (name, p)
            })
            .collect();

        let mut cells = BTreeMap::new();

        for &condition in &conditions {
            // 1-based design positions carrying this condition label, with
            // their Condition<NNN> tokens
            let blocks: Vec<(u32, String)> = design
                .iter()
                .enumerate()
                .filter(|&(_, &label)| label == condition)
                .map(|(pos, _)| {
                    let position = (pos + 1) as u32;
                    (position, token("Condition", position, pad))
                })
                .collect();

            for &region in regions {
                let region_tag = token("Source", region, pad);

                for &subject in subjects {
                    let subject_tag = token("Subject", subject, pad);

                    let cell: Vec<(u32, Option<PathBuf>)> = blocks
                        .iter()
                        .map(|(position, block_tag)| {
                            let mut matches = file_names.iter().filter(|(name, _)| {
                                name.contains(block_tag)
                                    && name.contains(&region_tag)
                                    && name.contains(&subject_tag)
                            });
                            let first = matches.next().map(|(_, path)| (*path).clone());
                            if matches.next().is_some() {
                                warn!(
                                    condition,
                                    block = position,
                                    region,
                                    subject,
                                    "multiple files match this block; keeping the first"
                                );
                            }
                            (*position, first)
                        })
                        .collect();

                    cells.insert((condition, region, subject), cell);
                }
            }
        }

        FileIndex {
            cells,
            conditions,
            regions: regions.to_vec(),
            subjects: subjects.to_vec(),
            pad,
        }
    }

    /// Unique condition labels, ascending
    pub fn conditions(&self) -> &[u32] {
        &self.conditions
    }

    /// Region numbers, in configured order
    pub fn regions(&self) -> &[u32] {
        &self.regions
    }

    /// Subject numbers, in configured order
    pub fn subjects(&self) -> &[u32] {
        &self.subjects
    }

    /// Zero-pad width the index was built with
    pub fn pad_width(&self) -> usize {
        self.pad
    }

    /// The matched paths of one cell, in block order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnresolvedCell`] naming the first block with
    /// no matching file.
    pub fn resolved_cell(
        &self,
        condition: u32,
        region: u32,
        subject: u32,
    ) -> EngineResult<Vec<&Path>> {
        let cell = self
            .cells
            .get(&(condition, region, subject))
            .ok_or(EngineError::UnresolvedCell {
                condition,
                block: 0,
                region,
                subject,
            })?;

        cell.iter()
            .map(|(block, path)| {
                path.as_deref().ok_or(EngineError::UnresolvedCell {
                    condition,
                    block: *block,
                    region,
                    subject,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beta_file(subject: u32, block: u32, region: u32) -> PathBuf {
        PathBuf::from(format!(
            "input/BETA_{}_{}_{}.nii",
            token("Subject", subject, 3),
            token("Condition", block, 3),
            token("Source", region, 3)
        ))
    }

    /// Files for 2 subjects, design [2,2,1,1], 1 region
    fn fixture_files() -> Vec<PathBuf> {
        let mut files = Vec::new();
        for subject in 1..=2 {
            for block in 1..=4 {
                files.push(beta_file(subject, block, 1));
            }
        }
        files
    }

    #[test]
    fn token_zero_pads() {
        assert_eq!(token("Subject", 7, 3), "Subject007");
        assert_eq!(token("Source", 12, 3), "Source012");
        // padding never truncates
        assert_eq!(token("Condition", 1234, 3), "Condition1234");
    }

    #[test]
    fn conditions_deduplicated_ascending() {
        let index = FileIndex::build(&fixture_files(), &[2, 2, 1, 1], &[1], &[1, 2], 3);
        assert_eq!(index.conditions(), &[1, 2]);
    }

    #[test]
    fn blocks_keep_design_order() {
        let index = FileIndex::build(&fixture_files(), &[2, 2, 1, 1], &[1], &[1, 2], 3);

        // condition 2 occupies design positions 1 and 2
        let cell = index.resolved_cell(2, 1, 1).unwrap();
        assert_eq!(cell.len(), 2);
        assert_eq!(cell[0], beta_file(1, 1, 1).as_path());
        assert_eq!(cell[1], beta_file(1, 2, 1).as_path());

        // condition 1 occupies positions 3 and 4
        let cell = index.resolved_cell(1, 1, 2).unwrap();
        assert_eq!(cell[0], beta_file(2, 3, 1).as_path());
        assert_eq!(cell[1], beta_file(2, 4, 1).as_path());
    }

    #[test]
    fn all_three_tokens_must_match() {
        // region 2 files exist only for subject 1
        let mut files = fixture_files();
        files.push(beta_file(1, 1, 2));
        files.push(beta_file(1, 2, 2));

        let index = FileIndex::build(&files, &[2, 2, 1, 1], &[2], &[1, 2], 3);
        assert!(index.resolved_cell(2, 2, 1).is_ok());

        let err = index.resolved_cell(2, 2, 2).unwrap_err();
        match err {
            EngineError::UnresolvedCell {
                condition,
                block,
                region,
                subject,
            } => {
                assert_eq!((condition, block, region, subject), (2, 1, 2, 2));
            }
            other => panic!("expected UnresolvedCell, got {other}"),
        }
    }

    #[test]
    fn ambiguous_match_keeps_first_sorted() {
        let mut files = fixture_files();
        // duplicate export of subject 1, block 1 with a suffix sorting later
        files.push(PathBuf::from(
            "input/BETA_Subject001_Condition001_Source001_copy.nii",
        ));
        files.sort();

        let index = FileIndex::build(&files, &[2, 2, 1, 1], &[1], &[1], 3);
        let cell = index.resolved_cell(2, 1, 1).unwrap();
        assert_eq!(cell[0], beta_file(1, 1, 1).as_path());
    }

    #[test]
    fn scan_missing_dir_is_an_error() {
        let err = scan_input_dir(Path::new("/nonexistent/inputs")).unwrap_err();
        assert!(matches!(err, EngineError::Scan { .. }));
    }
}
