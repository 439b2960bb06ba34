//! Dragon color sets and the per-session allocator that hands them out.

use macroquad::color::Color;
use std::collections::{HashMap, HashSet};

pub const PALETTE_SIZE: usize = 8;

/// One visual identity: every color a dragon is painted with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragonPalette {
    pub body: Color,
    pub dark: Color,
    pub wing: Color,
    pub underbelly: Color,
    pub outline: Color,
}

fn hex(rgb: u32) -> Color {
    Color::new(
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
        1.0,
    )
}

// body, dark, wing, underbelly, outline
const PALETTE_HEX: [[u32; 5]; PALETTE_SIZE] = [
    [0x427F38, 0x2A4E26, 0x386C32, 0xDCC79D, 0x213F1D], // green
    [0xB83A3A, 0x6E1F1F, 0x9C3030, 0xF2D3A0, 0x4A1414], // crimson
    [0x3A72B8, 0x1F416E, 0x30619C, 0xD6E4F2, 0x142A4A], // azure
    [0xD18B2C, 0x7A4F14, 0xB87722, 0xF7E7C1, 0x4D3008], // amber
    [0x7A4BB0, 0x45286A, 0x683F98, 0xE6D9F2, 0x2C1846], // violet
    [0x2FA39A, 0x1A5E59, 0x288A83, 0xD3F2EE, 0x0F3B38], // teal
    [0xD65A94, 0x7C2E54, 0xBA4C80, 0xF7DDE9, 0x4E1A33], // rose
    [0x6B7685, 0x3A414B, 0x5B6572, 0xE1E5EA, 0x23282F], // slate
];

/// Colors for palette entry `index` (taken modulo the palette size).
pub fn dragon_palette(index: usize) -> DragonPalette {
    let [body, dark, wing, underbelly, outline] = PALETTE_HEX[index % PALETTE_SIZE];
    DragonPalette {
        body: hex(body),
        dark: hex(dark),
        wing: hex(wing),
        underbelly: hex(underbelly),
        outline: hex(outline),
    }
}

/// Maps entity ids to palette indices for one render session.
///
/// A present entity keeps its index. A new entity takes the lowest free
/// index; once all indices are taken, it takes the index at the rotating
/// cursor and shares that color. The cursor advances by one on every new
/// assignment.
#[derive(Debug, Default)]
pub struct ColorAllocator {
    assignments: HashMap<String, usize>,
    cursor: usize,
}

impl ColorAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the palette index for `id`, assigning one on first sight.
    pub fn resolve(&mut self, id: &str) -> usize {
        if let Some(&index) = self.assignments.get(id) {
            return index;
        }

        let in_use: HashSet<usize> = self.assignments.values().copied().collect();
        let index = (0..PALETTE_SIZE)
            .find(|index| !in_use.contains(index))
            .unwrap_or(self.cursor);

        self.cursor = (self.cursor + 1) % PALETTE_SIZE;
        self.assignments.insert(id.to_string(), index);
        index
    }

    pub fn palette_for(&mut self, id: &str) -> DragonPalette {
        dragon_palette(self.resolve(id))
    }

    /// Forgets every id not in `present`. Run once per frame before any
    /// `resolve` so an id that vanished for a frame comes back as new.
    pub fn retain_present<'a, I>(&mut self, present: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: HashSet<&str> = present.into_iter().collect();
        self.assignments.retain(|id, _| present.contains(id.as_str()));
    }

    pub fn assigned(&self, id: &str) -> Option<usize> {
        self.assignments.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}
