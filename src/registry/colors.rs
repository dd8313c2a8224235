//! Runtime color schemes built from descriptor save data.

use serde::{Deserialize, Serialize};

use crate::level::{ColorSaveData, ColorSchemeSaveData};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl From<ColorSaveData> for Color {
    fn from(c: ColorSaveData) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub id: String,
    pub use_override: bool,
    pub saber_a: Color,
    pub saber_b: Color,
    pub environment_0: Color,
    pub environment_1: Color,
    pub obstacles: Color,
    pub supports_boost: bool,
    pub environment_0_boost: Color,
    pub environment_1_boost: Color,
}

impl ColorScheme {
    /// Build a scheme from save data. `None` when the save data has no body.
    ///
    /// Boost colors fall back to the plain environment colors when absent.
    pub fn from_save_data(save_data: &ColorSchemeSaveData) -> Option<Self> {
        let body = save_data.color_scheme.as_ref()?;
        let environment_0 = Color::from(body.environment_color0);
        let environment_1 = Color::from(body.environment_color1);
        let supports_boost =
            body.environment_color0_boost.is_some() || body.environment_color1_boost.is_some();

        Some(Self {
            id: body.color_scheme_id.clone(),
            use_override: save_data.use_override,
            saber_a: body.saber_a_color.into(),
            saber_b: body.saber_b_color.into(),
            environment_0,
            environment_1,
            obstacles: body.obstacles_color.into(),
            supports_boost,
            environment_0_boost: body
                .environment_color0_boost
                .map(Color::from)
                .unwrap_or(environment_0),
            environment_1_boost: body
                .environment_color1_boost
                .map(Color::from)
                .unwrap_or(environment_1),
        })
    }
}
