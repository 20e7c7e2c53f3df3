use serde::Serialize;

use super::types::Dimension;

/// Named size shortcut offered to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: &'static str,
    pub image_size: &'static str,
}

impl Preset {
    pub fn dimension(&self) -> Dimension {
        Dimension::new(self.width, self.height)
    }
}

const PRESETS: [Preset; 6] = [
    Preset {
        name: "Square",
        width: 1024,
        height: 1024,
        aspect_ratio: "1:1",
        image_size: "square_hd",
    },
    Preset {
        name: "Landscape 16:9",
        width: 1920,
        height: 1080,
        aspect_ratio: "16:9",
        image_size: "landscape_16_9",
    },
    Preset {
        name: "Portrait 9:16",
        width: 1080,
        height: 1920,
        aspect_ratio: "9:16",
        image_size: "portrait_9_16",
    },
    Preset {
        name: "Landscape 4:3",
        width: 1024,
        height: 768,
        aspect_ratio: "4:3",
        image_size: "landscape_4_3",
    },
    Preset {
        name: "Portrait 3:4",
        width: 768,
        height: 1024,
        aspect_ratio: "3:4",
        image_size: "portrait_3_4",
    },
    Preset {
        name: "Wide 21:9",
        width: 1920,
        height: 820,
        aspect_ratio: "21:9",
        image_size: "landscape_16_9",
    },
];

pub fn presets() -> &'static [Preset] {
    &PRESETS
}

/// Case-insensitive lookup by preset name.
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    let name = name.trim();
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
