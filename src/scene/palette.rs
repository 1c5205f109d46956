//! Colors of the night-street scene.

use crate::foundation::core::Rgba8;

pub const BACKGROUND_TOP: Rgba8 = Rgba8::rgb(0x1b, 0x14, 0x0f);
pub const BACKGROUND_BOTTOM: Rgba8 = Rgba8::rgb(0x2a, 0x1f, 0x18);
pub const GROUND: Rgba8 = Rgba8::rgb(0x23, 0x1a, 0x14);
/// Street-light gold; also the flicker overlay color.
pub const GOLD: Rgba8 = Rgba8::rgb(0xd6, 0xaa, 0x5c);
/// Pole, desk and judge bodies.
pub const MID: Rgba8 = Rgba8::rgb(0x3b, 0x2d, 0x24);

pub const MENTOR_BODY: Rgba8 = Rgba8::rgb(0x2d, 0x24, 0x1d);
pub const MENTOR_HEAD: Rgba8 = Rgba8::rgb(0x5c, 0x43, 0x34);

pub const JUDGE_HEAD: Rgba8 = Rgba8::rgb(0x2b, 0x21, 0x1a);
pub const SPEECH_OVAL: Rgba8 = Rgba8 {
    r: 200,
    g: 180,
    b: 140,
    a: 38,
};

pub const FIGURE_BODY: Rgba8 = Rgba8::rgb(0x3e, 0x2f, 0x25);
pub const SKIN: Rgba8 = Rgba8::rgb(0x6b, 0x4b, 0x39);
pub const HAIR: Rgba8 = Rgba8::rgb(0x2a, 0x1c, 0x15);

pub const GRAIN: Rgba8 = Rgba8 {
    r: 255,
    g: 255,
    b: 255,
    a: 8,
};

pub const TRANSPARENT_BLACK: Rgba8 = Rgba8 {
    r: 0,
    g: 0,
    b: 0,
    a: 0,
};

/// Gold at `alpha` in `[0, 1]`.
pub fn gold(alpha: f64) -> Rgba8 {
    GOLD.with_alpha(alpha)
}
