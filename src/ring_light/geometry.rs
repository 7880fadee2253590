use serde::{Deserialize, Serialize};

use crate::color::RgbColor;

/// `MouseEvent.buttons` mask with only the primary button held.
pub const PRIMARY_BUTTON: u16 = 1;

/// The conic gradient of the ring starts at the top, `atan2` starts at the right.
const GRADIENT_ORIGIN_OFFSET: f64 = 90.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding rectangle of the circular color control, in the same coordinate
/// space as the pointer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RingBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl RingBounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn center(&self) -> PointerPosition {
        PointerPosition {
            x: self.left + self.width / 2.0,
            y: self.top + self.height / 2.0,
        }
    }
}

/// Hue in `[0, 360)`. Straight above the center is 0°, straight below is 180°.
pub fn hue_at(pointer: PointerPosition, center: PointerPosition) -> f64 {
    let angle = (pointer.y - center.y)
        .atan2(pointer.x - center.x)
        .to_degrees();

    (angle + GRADIENT_ORIGIN_OFFSET + 360.0) % 360.0
}

pub fn resolve_color(pointer: PointerPosition, bounds: &RingBounds) -> RgbColor {
    RgbColor::from_hue(hue_at(pointer, bounds.center()))
}

/// Color picked by pressing on the ring.
pub fn pointer_down_color(pointer: PointerPosition, bounds: &RingBounds) -> String {
    resolve_color(pointer, bounds).to_hex()
}

/// Color picked while dragging. Only samples taken with exactly the primary
/// button held count as part of the gesture.
pub fn pointer_move_color(
    pointer: PointerPosition,
    bounds: &RingBounds,
    buttons: u16,
) -> Option<String> {
    if buttons != PRIMARY_BUTTON {
        return None;
    }

    Some(resolve_color(pointer, bounds).to_hex())
}
