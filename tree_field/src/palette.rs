//! Categorical color/scale palettes.
//!
//! A palette is a weighted list of [`Swatch`]es.  Sampling first picks a
//! swatch by weight, then a color uniformly from that swatch, then a scale
//! uniformly from the swatch's range.  Assignment happens once, at field
//! generation time.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{check_range, sample_range, FieldError};

// ════════════════════════════════════════════════════════════════════════════
// Colors
// ════════════════════════════════════════════════════════════════════════════

pub const GREEN_DARK:  u32 = 0x1F6B2E;
pub const GREEN_MID:   u32 = 0x2F8F3E;
pub const GREEN_LIGHT: u32 = 0x3FAE4F;
pub const GOLD:        u32 = 0xFFD700;
pub const RED:         u32 = 0xD93636;
pub const WHITE:       u32 = 0xFFFFFF;

/// `0xRRGGBB` → linear-ish `[0, 1]` RGB.
pub fn rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >>  8) & 0xFF) as f32 / 255.0,
        ( hex        & 0xFF) as f32 / 255.0,
    )
}

// ════════════════════════════════════════════════════════════════════════════
// Category / Swatch
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Foliage,
    Gold,
    Red,
    White,
}

/// One weighted palette entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Swatch {
    pub category: Category,
    /// Relative weight; need not sum to 1 across the palette.
    pub weight:   f32,
    /// Candidate colors as `0xRRGGBB`, picked uniformly.
    pub colors:   Vec<u32>,
    /// Uniform scale range `[min, max)`.
    pub scale:    (f32, f32),
}

impl Swatch {
    pub fn new(category: Category, weight: f32, colors: &[u32], scale: (f32, f32)) -> Self {
        Swatch { category, weight, colors: colors.to_vec(), scale }
    }
}

/// What a palette draw produced for one entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pick {
    pub category: Category,
    pub color:    Vec3,
    pub scale:    f32,
}

// ════════════════════════════════════════════════════════════════════════════
// Palette
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub swatches: Vec<Swatch>,
}

impl Palette {
    /// Sphere layer: mostly foliage with gold, red and white accents
    /// (65 / 15 / 12 / 8 %).
    pub fn spheres() -> Self {
        Palette {
            swatches: vec![
                Swatch::new(Category::Foliage, 0.65, &[GREEN_DARK, GREEN_MID, GREEN_LIGHT], (0.10, 0.25)),
                Swatch::new(Category::Gold,    0.15, &[GOLD],  (0.15, 0.27)),
                Swatch::new(Category::Red,     0.12, &[RED],   (0.14, 0.26)),
                Swatch::new(Category::White,   0.08, &[WHITE], (0.09, 0.15)),
            ],
        }
    }

    /// Cube layer: ornament boxes only (40 / 35 / 25 %).
    pub fn cubes() -> Self {
        Palette {
            swatches: vec![
                Swatch::new(Category::Gold,  0.40, &[GOLD],  (0.20, 0.35)),
                Swatch::new(Category::Red,   0.35, &[RED],   (0.20, 0.35)),
                Swatch::new(Category::White, 0.25, &[WHITE], (0.20, 0.35)),
            ],
        }
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        if self.swatches.is_empty() {
            return Err(FieldError::EmptyPalette);
        }
        for (index, s) in self.swatches.iter().enumerate() {
            if !(s.weight.is_finite() && s.weight > 0.0) {
                return Err(FieldError::BadWeight { index, weight: s.weight });
            }
            if s.colors.is_empty() {
                return Err(FieldError::EmptySwatch { index });
            }
            check_range("swatch scale", s.scale)?;
        }
        Ok(())
    }

    fn total_weight(&self) -> f32 {
        self.swatches.iter().map(|s| s.weight).sum()
    }

    /// Normalized probability of drawing `category`.
    pub fn share(&self, category: Category) -> f32 {
        let total = self.total_weight();
        if total <= 0.0 { return 0.0; }
        self.swatches
            .iter()
            .filter(|s| s.category == category)
            .map(|s| s.weight)
            .sum::<f32>() / total
    }

    /// Draw one entity's attributes.  The palette must have passed
    /// [`Palette::validate`].
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Pick {
        let mut r = rng.gen::<f32>() * self.total_weight();
        // Float round-off can leave `r` a hair above the last cumulative
        // bound; fall through to the final swatch in that case.
        let mut swatch = &self.swatches[self.swatches.len() - 1];
        for s in &self.swatches {
            if r < s.weight {
                swatch = s;
                break;
            }
            r -= s.weight;
        }

        let color = swatch.colors[rng.gen_range(0..swatch.colors.len())];
        Pick {
            category: swatch.category,
            color:    rgb(color),
            scale:    sample_range(rng, swatch.scale),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn draw_shares(p: &Palette, n: usize, seed: u64) -> HashMap<Category, f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut counts: HashMap<Category, usize> = HashMap::new();
        for _ in 0..n {
            *counts.entry(p.sample(&mut rng).category).or_default() += 1;
        }
        counts.into_iter().map(|(k, v)| (k, v as f32 / n as f32)).collect()
    }

    #[test]
    fn rgb_decodes_channels() {
        assert_eq!(rgb(0xFF0000), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(rgb(WHITE), Vec3::ONE);
    }

    #[test]
    fn presets_validate() {
        assert!(Palette::spheres().validate().is_ok());
        assert!(Palette::cubes().validate().is_ok());
    }

    #[test]
    fn sphere_shares_match_weights() {
        let shares = draw_shares(&Palette::spheres(), 40_000, 7);
        for (cat, expected) in [
            (Category::Foliage, 0.65),
            (Category::Gold,    0.15),
            (Category::Red,     0.12),
            (Category::White,   0.08),
        ] {
            let got = shares.get(&cat).copied().unwrap_or(0.0);
            assert!((got - expected).abs() < 0.015, "{:?}: {} vs {}", cat, got, expected);
        }
    }

    #[test]
    fn cube_palette_has_no_foliage() {
        let shares = draw_shares(&Palette::cubes(), 5_000, 3);
        assert!(!shares.contains_key(&Category::Foliage));
    }

    #[test]
    fn scale_within_swatch_range() {
        let p = Palette::spheres();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..2_000 {
            let pick = p.sample(&mut rng);
            let s = p.swatches.iter().find(|s| s.category == pick.category).unwrap();
            assert!(pick.scale >= s.scale.0 && pick.scale < s.scale.1 + 1e-6);
        }
    }

    #[test]
    fn share_normalizes_weights() {
        let p = Palette {
            swatches: vec![
                Swatch::new(Category::Red,   3.0, &[RED],   (0.1, 0.2)),
                Swatch::new(Category::White, 1.0, &[WHITE], (0.1, 0.2)),
            ],
        };
        assert_eq!(p.share(Category::Red), 0.75);
        assert_eq!(p.share(Category::Gold), 0.0);
    }

    #[test]
    fn validate_rejects_bad_entries() {
        assert_eq!(Palette { swatches: vec![] }.validate(), Err(FieldError::EmptyPalette));

        let zero = Palette { swatches: vec![Swatch::new(Category::Red, 0.0, &[RED], (0.1, 0.2))] };
        assert_eq!(zero.validate(), Err(FieldError::BadWeight { index: 0, weight: 0.0 }));

        let empty = Palette { swatches: vec![Swatch::new(Category::Red, 1.0, &[], (0.1, 0.2))] };
        assert_eq!(empty.validate(), Err(FieldError::EmptySwatch { index: 0 }));

        let inverted = Palette { swatches: vec![Swatch::new(Category::Red, 1.0, &[RED], (0.3, 0.2))] };
        assert!(matches!(inverted.validate(), Err(FieldError::BadRange { .. })));
    }
}
