use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RgbColor([u8; 3]);

impl RgbColor {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Fully saturated, mid-lightness color for a hue in degrees.
    pub fn from_hue(hue: f64) -> Self {
        Self::from_hsl(hue, 100.0, 50.0)
    }

    /// `saturation` and `lightness` are percentages.
    pub fn from_hsl(hue: f64, saturation: f64, lightness: f64) -> Self {
        let lightness = lightness / 100.0;
        let a = saturation * lightness.min(1.0 - lightness) / 100.0;
        let channel = |n: f64| {
            let k = (n + hue / 30.0) % 12.0;
            let value = lightness - a * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0);
            // half-up, so x.5 channels land on the upper value
            (255.0 * value + 0.5).floor().clamp(0.0, 255.0) as u8
        };

        Self([channel(0.0), channel(8.0), channel(4.0)])
    }

    /// Parse `#RRGGBB` (the leading `#` is optional, digits are case-insensitive).
    pub fn from_hex(value: &str) -> anyhow::Result<Self> {
        let digits = value.strip_prefix('#').unwrap_or(value);
        if digits.len() != 6 {
            anyhow::bail!("expected 6 hex digits, got {:?}", value);
        }

        let bytes = hex::decode(digits)
            .map_err(|err| anyhow::anyhow!("invalid hex color {:?}: {}", value, err))?;

        Ok(Self([bytes[0], bytes[1], bytes[2]]))
    }

    pub fn get_rgb(&self) -> [u8; 3] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        format!("#{}", hex::encode(self.0))
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
