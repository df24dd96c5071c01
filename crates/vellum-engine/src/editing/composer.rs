use std::collections::HashSet;

use crate::editing::position::{DocumentRange, DocumentSelection};
use crate::text::Attribution;

/// The attributions applied to the next text insertion.
///
/// Toggling a style with a collapsed selection flips these instead of
/// editing the document, so the next typed character picks the style up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposerPreferences {
    current_attributions: HashSet<Attribution>,
}

impl ComposerPreferences {
    pub fn current_attributions(&self) -> &HashSet<Attribution> {
        &self.current_attributions
    }

    pub fn add_attribution(&mut self, attribution: Attribution) {
        self.current_attributions.insert(attribution);
    }

    pub fn remove_attribution(&mut self, attribution: &Attribution) {
        self.current_attributions.remove(attribution);
    }

    pub fn toggle_attribution(&mut self, attribution: Attribution) {
        if !self.current_attributions.remove(&attribution) {
            self.current_attributions.insert(attribution);
        }
    }

    pub fn clear(&mut self) {
        self.current_attributions.clear();
    }
}

/// Owns the current selection plus transient input-composition state.
///
/// Selection changes through the composer are the only way callers observe
/// or set cursor state; `None` (no selection at all) is a valid state. The
/// composing region tracks an IME's pending multi-keystroke composition and
/// is opaque to the engine beyond its presence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    selection: Option<DocumentSelection>,
    composing_region: Option<DocumentRange>,
    preferences: ComposerPreferences,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection(selection: DocumentSelection) -> Self {
        Self {
            selection: Some(selection),
            ..Self::default()
        }
    }

    pub fn selection(&self) -> Option<&DocumentSelection> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Option<DocumentSelection>) {
        self.selection = selection;
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn composing_region(&self) -> Option<&DocumentRange> {
        self.composing_region.as_ref()
    }

    pub fn set_composing_region(&mut self, region: Option<DocumentRange>) {
        self.composing_region = region;
    }

    pub fn is_composing(&self) -> bool {
        self.composing_region.is_some()
    }

    pub fn preferences(&self) -> &ComposerPreferences {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut ComposerPreferences {
        &mut self.preferences
    }
}
