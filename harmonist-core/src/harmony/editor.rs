//! Progression editing
//!
//! `ProgressionEditor` owns one part's working state during a manual
//! editing session. Every accepted edit derives a new progression, re-voices
//! it, regenerates all compact labels and records a snapshot; rejected edits
//! leave the working part and the history untouched.

use crate::error::EditError;
use crate::harmony::part::{ChordLabels, HarmonizedPart};
use crate::types::chord::ChordQuality;
use crate::types::note::PitchClass;
use crate::types::progression::CompactProgression;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tracing::debug;

/// Maximum number of snapshots kept in history
pub const HISTORY_LIMIT: usize = 50;

/// The compact state of a progression at one point in the session
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub chord_qualities: Vec<ChordQuality>,
    pub chord_roots: Vec<PitchClass>,
    pub chord_labels: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Snapshot {
    pub fn capture(part: &HarmonizedPart) -> Self {
        let progression = part.progression();
        Self {
            chord_qualities: progression.qualities().to_vec(),
            chord_roots: progression.roots().to_vec(),
            chord_labels: part.labels_for(progression),
            timestamp: Utc::now(),
        }
    }

    pub fn progression(&self) -> CompactProgression {
        CompactProgression::from_parts(self.chord_qualities.clone(), self.chord_roots.clone())
    }

    pub fn len(&self) -> usize {
        self.chord_qualities.len()
    }

    /// Always false for snapshots taken from a valid progression
    pub fn is_empty(&self) -> bool {
        self.chord_qualities.is_empty()
    }
}

/// Bounded linear history: a list of snapshots and a cursor into it
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    entries: VecDeque<Snapshot>,
    cursor: usize,
}

impl History {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            entries: VecDeque::from([initial]),
            cursor: 0,
        }
    }

    /// Record a snapshot after the cursor, dropping any redo tail and the
    /// oldest entry when over the limit
    pub fn push(&mut self, snapshot: Snapshot) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(snapshot);
        while self.entries.len() > HISTORY_LIMIT {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    /// Working progression matches the last saved (or generated) one
    Clean,
    /// Unsaved edits present
    Dirty,
}

/// Editing session over one harmonized part
#[derive(Debug, Clone)]
pub struct ProgressionEditor {
    /// Part as it stood when the session started or was last saved
    baseline: HarmonizedPart,
    baseline_snapshot: Snapshot,
    working: HarmonizedPart,
    history: History,
    state: EditorState,
}

impl ProgressionEditor {
    pub fn new(part: HarmonizedPart) -> Self {
        let working = part.with_progression(part.progression().clone());
        let snapshot = Snapshot::capture(&working);
        Self {
            baseline: working.clone(),
            baseline_snapshot: snapshot.clone(),
            working,
            history: History::new(snapshot),
            state: EditorState::Clean,
        }
    }

    /// The working part in its compact view
    pub fn current(&self) -> &HarmonizedPart {
        &self.working
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == EditorState::Dirty
    }

    /// Replace the quality at `index`
    pub fn change(&mut self, index: usize, quality: ChordQuality) -> Result<&HarmonizedPart, EditError> {
        let next = self.working.progression().with_quality(index, quality)?;
        debug!(index, quality = %quality, "changed chord");
        Ok(self.apply(next))
    }

    /// Remove the entry at `index`; the last remaining chord cannot be deleted
    pub fn delete(&mut self, index: usize) -> Result<&HarmonizedPart, EditError> {
        let next = self.working.progression().without(index)?;
        debug!(index, "deleted chord");
        Ok(self.apply(next))
    }

    /// Insert a chord before `index`, sharing that entry's root
    pub fn insert_before(&mut self, index: usize, quality: ChordQuality) -> Result<&HarmonizedPart, EditError> {
        let next = self
            .working
            .progression()
            .with_inserted(index, index, quality)?;
        debug!(index, quality = %quality, "inserted chord before");
        Ok(self.apply(next))
    }

    /// Insert a chord after `index`, sharing that entry's root
    pub fn insert_after(&mut self, index: usize, quality: ChordQuality) -> Result<&HarmonizedPart, EditError> {
        let next = self
            .working
            .progression()
            .with_inserted(index, index + 1, quality)?;
        debug!(index, quality = %quality, "inserted chord after");
        Ok(self.apply(next))
    }

    /// Working parts derive from the baseline: equal progressions give equal parts
    fn apply(&mut self, progression: CompactProgression) -> &HarmonizedPart {
        self.working = self.baseline.with_progression(progression);
        self.history.push(Snapshot::capture(&self.working));
        self.refresh_state();
        &self.working
    }

    /// Step back one snapshot; `None` at the start of history
    pub fn undo(&mut self) -> Option<&HarmonizedPart> {
        let snapshot = self.history.undo()?.clone();
        debug!(cursor = self.history.cursor(), "undo");
        Some(self.restore(&snapshot))
    }

    /// Step forward one snapshot; `None` at the end of history
    pub fn redo(&mut self) -> Option<&HarmonizedPart> {
        let snapshot = self.history.redo()?.clone();
        debug!(cursor = self.history.cursor(), "redo");
        Some(self.restore(&snapshot))
    }

    fn restore(&mut self, snapshot: &Snapshot) -> &HarmonizedPart {
        let mut restored = self.baseline.with_progression(snapshot.progression());
        restored.chord_labels = ChordLabels::Compact(snapshot.chord_labels.clone());
        self.working = restored;
        self.refresh_state();
        &self.working
    }

    fn refresh_state(&mut self) {
        self.state = if self.working.progression() == self.baseline.progression() {
            EditorState::Clean
        } else {
            EditorState::Dirty
        };
    }

    /// Commit the working progression: returns the part with labels
    /// expanded onto the melody and makes it the new baseline
    pub fn save(&mut self) -> Result<HarmonizedPart, EditError> {
        let expanded = self.working.expanded_labels()?;
        let saved = HarmonizedPart {
            chord_labels: ChordLabels::Expanded(expanded),
            ..self.working.clone()
        };

        if let Some(current) = self.history.current() {
            self.baseline_snapshot = current.clone();
        }
        self.baseline = self.working.clone();
        self.history = History::new(self.baseline_snapshot.clone());
        self.state = EditorState::Clean;
        debug!(chords = saved.progression().len(), "saved progression");
        Ok(saved)
    }

    /// Drop all edits since the baseline and reset history
    pub fn discard(&mut self) -> &HarmonizedPart {
        self.working = self.baseline.clone();
        self.history = History::new(self.baseline_snapshot.clone());
        self.state = EditorState::Clean;
        debug!("discarded edits");
        &self.working
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmony::part::harmonize;
    use crate::types::note::MelodyElement::{Pitch, Rest};
    use crate::types::params::HarmonyParams;
    use crate::types::time::beats;
    use ChordQuality::*;

    /// Twelve quarter notes voiced over I-IV-V
    fn editor() -> ProgressionEditor {
        let melody = vec![
            Pitch(60),
            Pitch(64),
            Pitch(67),
            Pitch(72),
            Pitch(65),
            Pitch(69),
            Pitch(72),
            Rest,
            Pitch(67),
            Pitch(71),
            Pitch(74),
            Pitch(67),
        ];
        let rhythm = vec![beats(1); melody.len()];
        let part = harmonize(&melody, &rhythm, &HarmonyParams::default()).unwrap();
        let progression = CompactProgression::from_chords(&[(0, Major), (5, Major), (7, Major)]).unwrap();
        ProgressionEditor::new(part.with_progression(progression))
    }

    fn assert_consistent(part: &HarmonizedPart) {
        let progression = part.progression();
        assert_eq!(progression.qualities().len(), progression.roots().len());
        assert_eq!(part.chord_labels.len(), progression.len());
        assert_eq!(part.chord_labels.labels(), part.labels_for(progression).as_slice());
    }

    #[test]
    fn test_starts_clean_with_one_snapshot() {
        let editor = editor();
        assert_eq!(editor.state(), EditorState::Clean);
        assert_eq!(editor.history().len(), 1);
        assert_eq!(editor.current().chord_labels.labels(), &["C", "F", "G"]);
    }

    #[test]
    fn test_change_regenerates_labels() {
        let mut editor = editor();
        let part = editor.change(2, Dominant7).unwrap();
        assert_eq!(part.chord_labels.labels(), &["C", "F", "G7"]);
        assert_consistent(part);
        assert!(editor.is_dirty());
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn test_delete_first_of_three() {
        let mut editor = editor();
        let part = editor.delete(0).unwrap();
        assert_eq!(part.progression().roots(), &[5, 7]);
        assert_eq!(part.progression().qualities(), &[Major, Major]);
        assert_eq!(part.chord_labels.labels(), &["F", "G"]);
        assert_consistent(part);
    }

    #[test]
    fn test_insert_after_copies_reference_root() {
        let mut editor = editor();
        let part = editor.insert_after(0, Dominant7).unwrap();
        assert_eq!(part.progression().roots(), &[0, 0, 5, 7]);
        assert_eq!(part.progression().qualities(), &[Major, Dominant7, Major, Major]);
        assert_eq!(part.chord_labels.labels(), &["C", "C7", "F", "G"]);

        let part = editor.insert_before(3, Sus4).unwrap();
        assert_eq!(part.progression().roots(), &[0, 0, 5, 7, 7]);
        assert_eq!(part.chord_labels.labels()[3], "Gsus4");
    }

    #[test]
    fn test_rejected_edits_leave_state_untouched() {
        let mut editor = editor();
        let before = editor.current().clone();
        assert_eq!(
            editor.change(3, Minor).unwrap_err(),
            EditError::IndexOutOfBounds { index: 3, len: 3 }
        );
        assert!(editor.delete(7).is_err());
        assert!(editor.insert_after(3, Minor).is_err());
        assert_eq!(editor.current(), &before);
        assert_eq!(editor.history().len(), 1);
        assert_eq!(editor.state(), EditorState::Clean);
    }

    #[test]
    fn test_cannot_delete_last_chord() {
        let mut editor = editor();
        editor.delete(0).unwrap();
        editor.delete(0).unwrap();
        assert_eq!(editor.delete(0).unwrap_err(), EditError::LastChord);
        assert_eq!(editor.current().progression().len(), 1);
    }

    #[test]
    fn test_undo_redo_restore_snapshots() {
        let mut editor = editor();
        editor.change(0, Major7).unwrap();
        editor.delete(1).unwrap();
        let after_edits = editor.history().current().cloned();

        editor.undo().unwrap();
        assert_eq!(editor.current().chord_labels.labels(), &["Cmaj7", "F", "G"]);
        editor.redo().unwrap();
        assert_eq!(editor.history().current().cloned(), after_edits);
        assert_eq!(editor.current().chord_labels.labels(), &["Cmaj7", "G"]);

        editor.undo().unwrap();
        editor.undo().unwrap();
        assert!(editor.undo().is_none());
        assert_eq!(editor.state(), EditorState::Clean);
        assert_eq!(editor.current().chord_labels.labels(), &["C", "F", "G"]);
    }

    #[test]
    fn test_edit_after_undo_drops_redo_tail() {
        let mut editor = editor();
        editor.change(0, Minor).unwrap();
        editor.change(1, Minor).unwrap();
        editor.undo().unwrap();
        editor.change(2, Minor).unwrap();
        assert!(editor.redo().is_none());
        assert_eq!(editor.history().len(), 3);
        assert_eq!(editor.current().chord_labels.labels(), &["Cm", "F", "Gm"]);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut editor = editor();
        for k in 1..=60 {
            editor.change(0, ChordQuality::ALL[k % ChordQuality::ALL.len()]).unwrap();
        }
        assert_eq!(editor.history().len(), HISTORY_LIMIT);
        // Initial state and edits 1-10 were evicted, oldest first
        let oldest = editor.history().iter().next().map(|s| s.chord_qualities[0]);
        assert_eq!(oldest, Some(ChordQuality::ALL[11]));

        let mut undos = 0;
        while editor.undo().is_some() {
            undos += 1;
        }
        assert_eq!(undos, HISTORY_LIMIT - 1);
    }

    #[test]
    fn test_save_expands_and_is_idempotent() {
        let mut editor = editor();
        editor.change(2, Dominant7).unwrap();
        let first = editor.save().unwrap();
        let second = editor.save().unwrap();
        assert_eq!(first, second);
        assert!(first.chord_labels.is_expanded());
        // interval = ceil(12 / 3) = 4; position 7 is a rest
        assert_eq!(
            first.chord_labels.labels(),
            &["C", "C", "C", "C", "F", "F", "F", "G7", "G7", "G7", "G7"]
        );
        assert_eq!(editor.state(), EditorState::Clean);
        assert_eq!(editor.history().len(), 1);
        // Saved state is the new baseline
        assert_eq!(editor.discard().chord_labels.labels(), &["C", "F", "G7"]);
    }

    #[test]
    fn test_discard_restores_original() {
        let mut editor = editor();
        let original = editor.current().clone();
        editor.delete(0).unwrap();
        editor.insert_after(0, Minor7).unwrap();
        let restored = editor.discard().clone();
        assert_eq!(restored, original);
        assert_eq!(editor.history().len(), 1);
        assert_eq!(editor.state(), EditorState::Clean);
        assert!(editor.undo().is_none());
    }
}
