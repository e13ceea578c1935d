use std::{
    path::Path,
    fs::File,
    io::{
        BufReader,
        BufWriter,
    },
};
use serde::{Serialize, Deserialize};
use anyhow::*;
use vek::*;


pub const SETTINGS_FILE_NAME: &'static str = "settings.json";


/// Dialog settings. A client-side global resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// User scale factor applied to all inventory-image derived sizes.
    pub gui_scaling: f32,
    /// Nominal display density in dots per inch.
    pub screen_dpi: f32,
    /// Default dialog background color, rgb.
    pub default_bg_color: [u8; 3],
    /// Default dialog background opacity.
    pub default_bg_opacity: u8,
    /// Fullscreen dialog background color, rgb.
    pub fullscreen_bg_color: [u8; 3],
    /// Fullscreen dialog background opacity.
    pub fullscreen_bg_opacity: u8,
    /// Hover time before a field tooltip is shown, milliseconds.
    pub tooltip_show_delay_ms: u64,
    /// Whether item tooltips also show the raw item name.
    pub tooltip_append_itemname: bool,
    /// Whether a double click outside the dialog is remapped to escape.
    pub double_click_remap: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            gui_scaling: 1.0,
            screen_dpi: 96.0,
            default_bg_color: [0, 0, 0],
            default_bg_opacity: 140,
            fullscreen_bg_color: [0, 0, 0],
            fullscreen_bg_opacity: 140,
            tooltip_show_delay_ms: 400,
            tooltip_append_itemname: false,
            double_click_remap: false,
        }
    }
}

impl Settings {
    pub fn read(path: impl AsRef<Path>) -> Self {
        Self::try_read(path).unwrap_or_default()
    }

    pub fn try_read(path: impl AsRef<Path>) -> Result<Self> {
        Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), self)?;
        Ok(())
    }

    /// Default dialog background color with its opacity applied.
    pub fn default_bg_rgba(&self) -> Rgba<u8> {
        let [r, g, b] = self.default_bg_color;
        Rgba::new(r, g, b, self.default_bg_opacity)
    }

    /// Fullscreen background color with its opacity applied.
    pub fn fullscreen_bg_rgba(&self) -> Rgba<u8> {
        let [r, g, b] = self.fullscreen_bg_color;
        Rgba::new(r, g, b, self.fullscreen_bg_opacity)
    }
}
