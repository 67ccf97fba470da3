use crate::error::EditError;
use crate::types::chord::ChordQuality;
use crate::types::note::PitchClass;

/// Per-segment (root, quality) representation of a progression.
///
/// The two sequences always have the same, non-zero length. Every edit
/// returns a new value so earlier snapshots stay valid.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompactProgression {
    chord_qualities: Vec<ChordQuality>,
    chord_roots: Vec<PitchClass>,
}

impl CompactProgression {
    pub fn new(
        chord_qualities: Vec<ChordQuality>,
        chord_roots: Vec<PitchClass>,
    ) -> Result<Self, EditError> {
        if chord_qualities.is_empty() || chord_roots.is_empty() {
            return Err(EditError::EmptyProgression);
        }
        if chord_qualities.len() != chord_roots.len() {
            return Err(EditError::MismatchedLengths {
                qualities: chord_qualities.len(),
                roots: chord_roots.len(),
            });
        }
        let chord_roots = chord_roots.into_iter().map(|r| r % 12).collect();
        Ok(Self {
            chord_qualities,
            chord_roots,
        })
    }

    /// Construct from sequences already known to be non-empty and aligned
    pub(crate) fn from_parts(chord_qualities: Vec<ChordQuality>, chord_roots: Vec<PitchClass>) -> Self {
        debug_assert!(!chord_qualities.is_empty());
        debug_assert_eq!(chord_qualities.len(), chord_roots.len());
        Self {
            chord_qualities,
            chord_roots: chord_roots.into_iter().map(|r| r % 12).collect(),
        }
    }

    /// Build from (root, quality) pairs
    pub fn from_chords(chords: &[(PitchClass, ChordQuality)]) -> Result<Self, EditError> {
        let (roots, qualities) = chords.iter().copied().unzip();
        Self::new(qualities, roots)
    }

    pub fn len(&self) -> usize {
        self.chord_qualities.len()
    }

    /// Always false; kept for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.chord_qualities.is_empty()
    }

    pub fn qualities(&self) -> &[ChordQuality] {
        &self.chord_qualities
    }

    pub fn roots(&self) -> &[PitchClass] {
        &self.chord_roots
    }

    pub fn get(&self, index: usize) -> Option<(PitchClass, ChordQuality)> {
        Some((*self.chord_roots.get(index)?, *self.chord_qualities.get(index)?))
    }

    /// Iterate (root, quality) pairs in order
    pub fn chords(&self) -> impl Iterator<Item = (PitchClass, ChordQuality)> + '_ {
        self.chord_roots
            .iter()
            .copied()
            .zip(self.chord_qualities.iter().copied())
    }

    fn check_index(&self, index: usize) -> Result<(), EditError> {
        if index >= self.len() {
            return Err(EditError::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        Ok(())
    }

    /// Copy with the quality at `index` replaced
    pub fn with_quality(&self, index: usize, quality: ChordQuality) -> Result<Self, EditError> {
        self.check_index(index)?;
        let mut chord_qualities = self.chord_qualities.clone();
        chord_qualities[index] = quality;
        Ok(Self {
            chord_qualities,
            chord_roots: self.chord_roots.clone(),
        })
    }

    /// Copy with the entry at `index` removed; never leaves an empty progression
    pub fn without(&self, index: usize) -> Result<Self, EditError> {
        self.check_index(index)?;
        if self.len() == 1 {
            return Err(EditError::LastChord);
        }
        let mut chord_qualities = self.chord_qualities.clone();
        let mut chord_roots = self.chord_roots.clone();
        chord_qualities.remove(index);
        chord_roots.remove(index);
        Ok(Self {
            chord_qualities,
            chord_roots,
        })
    }

    /// Copy with a new entry at `position` (0..=len), sharing the root of the
    /// reference entry at `reference`
    pub fn with_inserted(
        &self,
        reference: usize,
        position: usize,
        quality: ChordQuality,
    ) -> Result<Self, EditError> {
        self.check_index(reference)?;
        if position > self.len() {
            return Err(EditError::IndexOutOfBounds {
                index: position,
                len: self.len(),
            });
        }
        let root = self.chord_roots[reference];
        let mut chord_qualities = self.chord_qualities.clone();
        let mut chord_roots = self.chord_roots.clone();
        chord_qualities.insert(position, quality);
        chord_roots.insert(position, root);
        Ok(Self {
            chord_qualities,
            chord_roots,
        })
    }
}
