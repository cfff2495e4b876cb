//! Built-in gallery of animated presets.
//!
//! Presets are sent by URL: the backend downloads and converts them, so the
//! panel never touches the GIF data itself.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct Preset {
    #[schema(value_type = String, example = "Pacman")]
    pub name: &'static str,
    #[schema(value_type = String, example = "https://media.giphy.com/media/d9QiBcfem5Mh8o/giphy.gif")]
    pub url: &'static str,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "Mario Run",
        url: "https://media.giphy.com/media/v1.Y2lkPTc5MGI3NjExM3V4c2Z5ZmF4dW14Z3V4Z3V4Z3V4Z3V4Z3V4Z3V4Zy9sM3YzYzR3/giphy.gif",
    },
    Preset {
        name: "Pacman",
        url: "https://media.giphy.com/media/d9QiBcfem5Mh8o/giphy.gif",
    },
    Preset {
        name: "Nyan Cat",
        url: "https://media.giphy.com/media/sIIhZliB2McAo/giphy.gif",
    },
    Preset {
        name: "Invader",
        url: "https://media.giphy.com/media/v1.Y2lkPTc5MGI3NjExaDZ4eHR5eHR5eHR5eHR5eHR5eHR5eHR5eHR5eHR5Zy9QZ2phUFM/giphy.gif",
    },
    Preset {
        name: "Ghost",
        url: "https://media.giphy.com/media/10xc8M0pZk1p96/giphy.gif",
    },
    Preset {
        name: "Fire",
        url: "https://media.giphy.com/media/3o7TKSjRrfIPjeiVyM/giphy.gif",
    },
    Preset {
        name: "Heart",
        url: "https://media.giphy.com/media/l41lFj8afMrk7gGXu/giphy.gif",
    },
    Preset {
        name: "Slime",
        url: "https://media.giphy.com/media/3o7TKMt1VVNkHVyPaE/giphy.gif",
    },
];

/// Look up a preset by name, ignoring case.
pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
