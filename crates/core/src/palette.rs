//! Palette module - the fixed, ordered list of cell colors
//!
//! Colors are referenced by [`ColorId`] (their index in the list). Each entry
//! carries an opaque render handle for hosts; the core only compares ids.

use serde::{Deserialize, Serialize};

use crate::rng::SimpleRng;
use crate::types::ColorId;

/// One palette entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorEntry {
    pub name: String,
    /// Opaque rendering handle (a glyph for terminal hosts)
    pub glyph: char,
}

impl ColorEntry {
    pub fn new(name: impl Into<String>, glyph: char) -> Self {
        Self {
            name: name.into(),
            glyph,
        }
    }
}

pub fn standard_entries() -> Vec<ColorEntry> {
    vec![
        ColorEntry::new("red", 'R'),
        ColorEntry::new("green", 'G'),
        ColorEntry::new("blue", 'B'),
        ColorEntry::new("yellow", 'Y'),
    ]
}

/// Fixed ordered list of colors with a seeded uniform draw
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<ColorEntry>,
    rng: SimpleRng,
}

impl Palette {
    pub fn new(entries: Vec<ColorEntry>, seed: u32) -> Self {
        Self {
            entries,
            rng: SimpleRng::new(seed),
        }
    }

    /// Four-color palette used when no configuration is supplied
    pub fn standard(seed: u32) -> Self {
        Self::new(standard_entries(), seed)
    }

    pub fn entries(&self) -> &[ColorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, color: ColorId) -> Option<&ColorEntry> {
        self.entries.get(color.0 as usize)
    }

    /// Look a color up by name (case-insensitive)
    pub fn find(&self, name: &str) -> Option<ColorId> {
        self.entries
            .iter()
            .position(|e| e.name.eq_ignore_ascii_case(name))
            .map(|i| ColorId(i as u16))
    }

    pub fn ids(&self) -> impl Iterator<Item = ColorId> + '_ {
        (0..self.entries.len()).map(|i| ColorId(i as u16))
    }

    /// Draw a color uniformly over the list; `None` when the palette is empty
    pub fn random_color(&mut self) -> Option<ColorId> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = self.rng.next_range(self.entries.len() as u32);
        Some(ColorId(idx as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_color_in_range() {
        let mut palette = Palette::standard(3);
        for _ in 0..200 {
            let c = palette.random_color().unwrap();
            assert!(palette.get(c).is_some());
        }
    }

    #[test]
    fn test_empty_palette_draws_nothing() {
        let mut palette = Palette::new(Vec::new(), 1);
        assert!(palette.is_empty());
        assert_eq!(palette.random_color(), None);
    }

    #[test]
    fn test_find_by_name() {
        let palette = Palette::standard(1);
        assert_eq!(palette.find("BLUE"), Some(ColorId(2)));
        assert_eq!(palette.find("mauve"), None);
        assert_eq!(palette.ids().count(), 4);
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = Palette::standard(77);
        let mut b = Palette::standard(77);
        for _ in 0..50 {
            assert_eq!(a.random_color(), b.random_color());
        }
    }
}
