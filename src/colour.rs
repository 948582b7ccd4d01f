//! Consistent colour generation (XEP-0392) for avatar placeholders.

use std::fmt;

use sha1::{Digest, Sha1};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn channel(c: f64) -> u8 {
        (c.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    pub fn to_hex(self) -> String {
        format!(
            "#{:02x}{:02x}{:02x}",
            Self::channel(self.r),
            Self::channel(self.g),
            Self::channel(self.b)
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

const SATURATION: f64 = 75.0;
const LIGHTNESS: f64 = 60.0;
const DIM: f64 = 0.8;

pub fn text_to_colour(text: &str) -> Rgb {
    let digest = Sha1::digest(text.as_bytes());
    let hue = f64::from(u16::from_le_bytes([digest[0], digest[1]])) / f64::from(u16::MAX);
    let (r, g, b) = hsluv_to_rgb(hue * 360.0, SATURATION, LIGHTNESS);
    Rgb {
        r: r.clamp(0.0, 1.0) * DIM,
        g: g.clamp(0.0, 1.0) * DIM,
        b: b.clamp(0.0, 1.0) * DIM,
    }
}

const M: [[f64; 3]; 3] = [
    [3.240_969_941_904_521, -1.537_383_177_570_093, -0.498_610_760_293],
    [-0.969_243_636_280_87, 1.875_967_501_507_72, 0.041_555_057_407_175],
    [0.055_630_079_696_993, -0.203_976_958_888_97, 1.056_971_514_242_878],
];
const REF_U: f64 = 0.197_830_006_642_83;
const REF_V: f64 = 0.468_319_994_938_79;
const KAPPA: f64 = 903.296_296_296_296_3;
const EPSILON: f64 = 0.008_856_451_679_035_631;

fn bounds(l: f64) -> Vec<(f64, f64)> {
    let sub1 = (l + 16.0).powi(3) / 1_560_896.0;
    let sub2 = if sub1 > EPSILON { sub1 } else { l / KAPPA };
    let mut lines = Vec::with_capacity(6);
    for [m1, m2, m3] in M {
        for t in [0.0, 1.0] {
            let top1 = (284_517.0 * m1 - 94_839.0 * m3) * sub2;
            let top2 = (838_422.0 * m3 + 769_860.0 * m2 + 731_718.0 * m1) * l * sub2
                - 769_860.0 * t * l;
            let bottom = (632_260.0 * m3 - 126_452.0 * m2) * sub2 + 126_452.0 * t;
            lines.push((top1 / bottom, top2 / bottom));
        }
    }
    lines
}

fn max_chroma_for_lh(l: f64, h: f64) -> f64 {
    let hrad = h.to_radians();
    bounds(l)
        .into_iter()
        .map(|(slope, intercept)| intercept / (hrad.sin() - slope * hrad.cos()))
        .filter(|length| *length >= 0.0)
        .fold(f64::MAX, f64::min)
}

fn l_to_y(l: f64) -> f64 {
    if l <= 8.0 {
        l / KAPPA
    } else {
        ((l + 16.0) / 116.0).powi(3)
    }
}

fn from_linear(c: f64) -> f64 {
    if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn hsluv_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    // HSLuv -> LCh
    let c = if l > 99.999_999_9 || l < 0.000_000_01 {
        0.0
    } else {
        max_chroma_for_lh(l, h) / 100.0 * s
    };

    // LCh -> Luv
    let hrad = h.to_radians();
    let u = hrad.cos() * c;
    let v = hrad.sin() * c;

    // Luv -> XYZ
    if l == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let var_u = u / (13.0 * l) + REF_U;
    let var_v = v / (13.0 * l) + REF_V;
    let y = l_to_y(l);
    let x = 0.0 - (9.0 * y * var_u) / ((var_u - 4.0) * var_v - var_u * var_v);
    let z = (9.0 * y - 15.0 * var_v * y - var_v * x) / (3.0 * var_v);

    // XYZ -> sRGB
    let [r, g, b] = M.map(|[m1, m2, m3]| from_linear(m1 * x + m2 * y + m3 * z));
    (r, g, b)
}
