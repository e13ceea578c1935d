//! Pixel metrics and the two coordinate systems.
//!
//! Every element position is resolved under exactly one of two models:
//!
//! - legacy: grid units scaled by the inventory slot `spacing`, shifted by the
//!   form `padding`, with per-element fudge factors;
//! - real: grid units scaled by the inventory image size `imgsize`, anchored
//!   at the element's own top left.
//!
//! The active model is a property of the layout session, never of an element,
//! and the two are never mixed while resolving a single element.

use crate::settings::Settings;
use vek::*;


/// Screen size a size-locked dialog is laid out against.
pub const LOCK_SCREEN_SIZE: Extent2<f32> = Extent2 { w: 800.0, h: 600.0 };

/// Fallback dialog size when no `size[]` was given.
pub const FALLBACK_DIALOG_SIZE: Extent2<f32> = Extent2 { w: 580.0, h: 300.0 };

/// Inventory image size in inches for size-locked dialogs. Tuned so the
/// reference dialog (15.5 slots wide including border) fits the reference
/// 800px screen at 96 DPI and scale 1.0.
const FIXED_IMGSIZE_INCHES: f64 = 0.5555;

/// Floor on the inventory image size in inches, applied even when the form
/// then does not fit the screen.
const MIN_IMGSIZE_INCHES: f64 = 0.3;

/// Pixel sizes everything in a laid-out form is proportional to.
///
/// Slot spacing is 5/4 image size horizontally and 15/13 vertically; the form
/// padding is 3/8 image size; button half-height is 35% of vertical spacing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FormMetrics {
    pub imgsize: Extent2<f32>,
    pub spacing: Extent2<f32>,
    pub padding: Vec2<f32>,
    pub btn_height: f32,
}

impl FormMetrics {
    fn from_imgsize(use_imgsize: f64) -> Self {
        let img = use_imgsize as f32;
        FormMetrics {
            imgsize: Extent2::new(img, img),
            spacing: Extent2::new(img * 5.0 / 4.0, img * 15.0 / 13.0),
            padding: Vec2::new(img * 3.0 / 8.0, img * 3.0 / 8.0),
            btn_height: img * 15.0 / 13.0 * 0.35,
        }
    }

    /// Metrics for a size-locked dialog: image size is a fixed physical size.
    pub fn fixed(settings: &Settings) -> Self {
        let use_imgsize =
            FIXED_IMGSIZE_INCHES * settings.screen_dpi as f64 * settings.gui_scaling as f64;
        Self::from_imgsize(use_imgsize)
    }

    /// Metrics for a free dialog: prefer 1/15 of screen height, scaled down
    /// until the requested grid fits both screen axes, floored at a fixed
    /// physical minimum.
    pub fn variable(
        settings: &Settings,
        screensize: Extent2<f32>,
        invsize: Extent2<f32>,
    ) -> Self {
        let gui_scaling = settings.gui_scaling as f64;
        let prefer_imgsize = screensize.h as f64 / 15.0 * gui_scaling;
        let fitx_imgsize =
            screensize.w as f64 / ((5.0 / 4.0) * (0.5 + invsize.w as f64));
        let fity_imgsize =
            screensize.h as f64 / ((15.0 / 13.0) * (0.85 * invsize.h as f64));
        let min_imgsize = MIN_IMGSIZE_INCHES * settings.screen_dpi as f64 * gui_scaling;
        let use_imgsize = min_imgsize.max(prefer_imgsize.min(fitx_imgsize.min(fity_imgsize)));
        Self::from_imgsize(use_imgsize)
    }

    /// Metrics for a form with no `size[]`: only the button height is
    /// meaningful, derived from the font. Grid-dependent elements warn and
    /// resolve against zeroed slot sizes.
    pub fn fallback(font: &dyn FontMetrics) -> Self {
        FormMetrics {
            imgsize: Extent2::zero(),
            spacing: Extent2::zero(),
            padding: Vec2::zero(),
            btn_height: font.line_height() * 0.875,
        }
    }

    /// Form pixel size for an explicit grid size under the given mode.
    pub fn form_size(&self, invsize: Extent2<f32>, real_coordinates: bool) -> Extent2<f32> {
        if real_coordinates {
            Extent2::new(invsize.w * self.imgsize.w, invsize.h * self.imgsize.h)
        } else {
            Extent2::new(
                self.padding.x * 2.0 + self.spacing.w * (invsize.w - 1.0) + self.imgsize.w,
                self.padding.y * 2.0
                    + self.spacing.h * (invsize.h - 1.0)
                    + self.imgsize.h
                    + self.btn_height * 2.0 / 3.0,
            )
        }
    }

    // ==== element coordinate resolvers ====

    /// Legacy base position: padding plus container offset and grid position,
    /// both in spacing units. `origin` shifts into absolute screen space.
    pub fn legacy_base_pos(
        &self,
        origin: Option<Vec2<f32>>,
        pos_offset: Vec2<f32>,
        v_pos: Option<Vec2<f32>>,
    ) -> Vec2<f32> {
        let mut pos = self.padding;
        if let Some(origin) = origin {
            pos += origin;
        }
        pos += pos_offset * Vec2::new(self.spacing.w, self.spacing.h);
        if let Some(v_pos) = v_pos {
            pos += v_pos * Vec2::new(self.spacing.w, self.spacing.h);
        }
        pos
    }

    /// Legacy geometry in spacing units.
    pub fn legacy_geom(&self, v_geom: Vec2<f32>) -> Extent2<f32> {
        Extent2::new(v_geom.x * self.spacing.w, v_geom.y * self.spacing.h)
    }

    /// Real base position: grid position plus container offset, in image-size
    /// units. `origin` shifts into absolute screen space.
    pub fn real_base_pos(
        &self,
        origin: Option<Vec2<f32>>,
        pos_offset: Vec2<f32>,
        v_pos: Vec2<f32>,
    ) -> Vec2<f32> {
        let pos = (v_pos + pos_offset) * Vec2::new(self.imgsize.w, self.imgsize.h);
        match origin {
            Some(origin) => pos + origin,
            None => pos,
        }
    }

    /// Real geometry in image-size units.
    pub fn real_geom(&self, v_geom: Vec2<f32>) -> Extent2<f32> {
        Extent2::new(v_geom.x * self.imgsize.w, v_geom.y * self.imgsize.h)
    }
}

/// Centering shift for a size-locked dialog on a screen larger than the lock
/// size. Smaller screens get no shift on that axis.
pub fn lock_offset(current: Extent2<f32>, locked: Extent2<f32>) -> Vec2<f32> {
    Vec2::new(
        if current.w > locked.w { (current.w - locked.w) / 2.0 } else { 0.0 },
        if current.h > locked.h { (current.h - locked.h) / 2.0 } else { 0.0 },
    )
}

/// Dialog rectangle from the screen size, the `position[]` offset fractions,
/// and the `anchor[]` fractions, plus any lock centering shift.
pub fn dialog_rect(
    screensize: Extent2<f32>,
    size: Extent2<f32>,
    offset: Vec2<f32>,
    anchor: Vec2<f32>,
    shift: Vec2<f32>,
) -> Rect<f32, f32> {
    Rect::new(
        screensize.w * offset.x - anchor.x * size.w + shift.x,
        screensize.h * offset.y - anchor.y * size.h + shift.y,
        size.w,
        size.h,
    )
}

/// Point-in-rect test, inclusive on all edges.
pub fn rect_contains(rect: Rect<f32, f32>, p: Vec2<f32>) -> bool {
    p.x >= rect.x
        && p.y >= rect.y
        && p.x <= rect.x + rect.w
        && p.y <= rect.y + rect.h
}

/// Center of a rect.
pub fn rect_center(rect: Rect<f32, f32>) -> Vec2<f32> {
    Vec2::new(rect.x + rect.w / 2.0, rect.y + rect.h / 2.0)
}

/// Font shaping collaborator. Only coarse line metrics and widths are needed,
/// to size label rects and the fallback button height.
pub trait FontMetrics {
    fn line_height(&self) -> f32;

    fn text_width(&self, text: &str) -> f32;
}

/// Fixed-advance stand-in font for hosts without text shaping.
#[derive(Debug, Copy, Clone)]
pub struct NominalFont {
    pub height: f32,
}

impl Default for NominalFont {
    fn default() -> Self {
        NominalFont { height: 16.0 }
    }
}

impl FontMetrics for NominalFont {
    fn line_height(&self) -> f32 {
        self.height
    }

    fn text_width(&self, text: &str) -> f32 {
        self.height * 0.5 * text.chars().count() as f32
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn variable_prefers_fifteenth_of_height() {
        let m = FormMetrics::variable(
            &settings(),
            Extent2::new(4000.0, 1500.0),
            Extent2::new(8.0, 8.0),
        );
        assert_eq!(m.imgsize.w, 100.0);
        assert_eq!(m.spacing.w, 125.0);
        assert!((m.spacing.h - 100.0 * 15.0 / 13.0).abs() < 1e-3);
    }

    #[test]
    fn variable_shrinks_to_fit_width() {
        let wide_grid = FormMetrics::variable(
            &settings(),
            Extent2::new(1000.0, 10000.0),
            Extent2::new(15.5, 2.0),
        );
        let expect = 1000.0 / ((5.0 / 4.0) * (0.5 + 15.5));
        assert!((wide_grid.imgsize.w - expect as f32).abs() < 1e-3);
    }

    #[test]
    fn variable_floors_at_physical_minimum() {
        let m = FormMetrics::variable(
            &settings(),
            Extent2::new(100.0, 100.0),
            Extent2::new(30.0, 30.0),
        );
        // 0.3in at 96 dpi
        assert!((m.imgsize.w - 28.8).abs() < 1e-3);
    }

    #[test]
    fn legacy_resolver_applies_padding_offset_and_grid() {
        let m = FormMetrics::from_imgsize(100.0);
        let pos = m.legacy_base_pos(None, Vec2::new(1.0, 0.0), Some(Vec2::new(2.0, 3.0)));
        assert_eq!(pos.x, m.padding.x + 3.0 * m.spacing.w);
        assert_eq!(pos.y, m.padding.y + 3.0 * m.spacing.h);
    }

    #[test]
    fn real_resolver_is_imgsize_scaled() {
        let m = FormMetrics::from_imgsize(48.0);
        let pos = m.real_base_pos(Some(Vec2::new(10.0, 20.0)), Vec2::zero(), Vec2::new(1.0, 2.0));
        assert_eq!(pos, Vec2::new(58.0, 116.0));
        assert_eq!(m.real_geom(Vec2::new(1.0, 1.0)), Extent2::new(48.0, 48.0));
    }

    #[test]
    fn dialog_rect_centers_by_default() {
        let rect = dialog_rect(
            Extent2::new(1000.0, 800.0),
            Extent2::new(200.0, 100.0),
            Vec2::new(0.5, 0.5),
            Vec2::new(0.5, 0.5),
            Vec2::zero(),
        );
        assert_eq!(rect, Rect::new(400.0, 350.0, 200.0, 100.0));
    }

    #[test]
    fn lock_offset_only_grows() {
        assert_eq!(
            lock_offset(Extent2::new(1000.0, 500.0), LOCK_SCREEN_SIZE),
            Vec2::new(100.0, 0.0),
        );
    }

    #[test]
    fn rect_containment_is_edge_inclusive() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect_contains(rect, Vec2::new(10.0, 10.0)));
        assert!(rect_contains(rect, Vec2::new(30.0, 30.0)));
        assert!(!rect_contains(rect, Vec2::new(30.1, 30.0)));
        assert_eq!(rect_center(rect), Vec2::new(20.0, 20.0));
    }
}
