use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp, Interpolation, Projection};

/// 2x3 affine transform mapping source pixels to destination pixels:
/// `x' = a*x + b*y + c`, `y' = d*x + e*y + f`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2 {
    m: [f64; 6],
}

impl Affine2 {
    pub const IDENTITY: Affine2 = Affine2 {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
    };

    pub fn new(m: [f64; 6]) -> Self {
        Self { m }
    }

    pub fn coefficients(&self) -> [f64; 6] {
        self.m
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new([1.0, 0.0, tx, 0.0, 1.0, ty])
    }

    /// Rotation by `angle_degrees` (counter-clockwise on screen) combined with
    /// an isotropic `scale`, both about `center`
    pub fn rotation_about(center: (f64, f64), angle_degrees: f64, scale: f64) -> Self {
        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        let alpha = scale * cos;
        let beta = scale * sin;
        let (cx, cy) = center;

        Self::new([
            alpha,
            beta,
            (1.0 - alpha) * cx - beta * cy,
            -beta,
            alpha,
            beta * cx + (1.0 - alpha) * cy,
        ])
    }

    /// Isotropic zoom about `center`
    pub fn scale_about(center: (f64, f64), scale: f64) -> Self {
        Self::rotation_about(center, 0.0, scale)
    }

    /// Transform applying `self` first, then `next`
    pub fn then(&self, next: &Affine2) -> Affine2 {
        let [a1, b1, c1, d1, e1, f1] = self.m;
        let [a2, b2, c2, d2, e2, f2] = next.m;

        Affine2::new([
            a2 * a1 + b2 * d1,
            a2 * b1 + b2 * e1,
            a2 * c1 + b2 * f1 + c2,
            d2 * a1 + e2 * d1,
            d2 * b1 + e2 * e1,
            d2 * c1 + e2 * f1 + f2,
        ])
    }

    /// Inverse transform, `None` when the transform is degenerate
    pub fn invert(&self) -> Option<Affine2> {
        let [a, b, c, d, e, f] = self.m;
        let det = a * e - b * d;
        if det.abs() < f64::EPSILON {
            return None;
        }

        let inv_a = e / det;
        let inv_b = -b / det;
        let inv_d = -d / det;
        let inv_e = a / det;

        Some(Affine2::new([
            inv_a,
            inv_b,
            -(inv_a * c + inv_b * f),
            inv_d,
            inv_e,
            -(inv_d * c + inv_e * f),
        ]))
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.m;
        (a * x + b * y + c, d * x + e * y + f)
    }

    pub fn is_identity(&self) -> bool {
        self.m
            .iter()
            .zip(Self::IDENTITY.m.iter())
            .all(|(v, id)| (v - id).abs() < 1e-12)
    }
}

/// How samples outside the source image are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderMode {
    /// Black
    Constant,
    /// Mirror the image at its edges (`fedcba|abcdefgh|hgfedcb`)
    Reflect,
}

/// Warp `src` by `transform` into an image of the same size, sampling bilinearly
pub fn warp_affine(src: &RgbImage, transform: &Affine2, border: BorderMode) -> RgbImage {
    let (width, height) = src.dimensions();
    if transform.is_identity() {
        return src.clone();
    }

    match border {
        BorderMode::Constant => {
            let [a, b, c, d, e, f] = transform.coefficients().map(|v| v as f32);
            match Projection::from_matrix([a, b, c, d, e, f, 0.0, 0.0, 1.0]) {
                Some(projection) => warp(src, &projection, Interpolation::Bilinear, Rgb([0, 0, 0])),
                None => RgbImage::new(width, height),
            }
        }
        // imageproc only fills with a constant
        BorderMode::Reflect => {
            let Some(inverse) = transform.invert() else {
                return RgbImage::new(width, height);
            };
            RgbImage::from_fn(width, height, |x, y| {
                let (sx, sy) = inverse.apply(x as f64, y as f64);
                sample_reflected(src, sx, sy)
            })
        }
    }
}

fn sample_reflected(src: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = fetch_reflected(src, x0, y0);
    let p10 = fetch_reflected(src, x0 + 1, y0);
    let p01 = fetch_reflected(src, x0, y0 + 1);
    let p11 = fetch_reflected(src, x0 + 1, y0 + 1);

    let mut out = [0u8; 3];
    for (c, value) in out.iter_mut().enumerate() {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        *value = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

fn fetch_reflected(src: &RgbImage, x: i64, y: i64) -> Rgb<u8> {
    let rx = reflect(x, src.width() as i64);
    let ry = reflect(y, src.height() as i64);
    *src.get_pixel(rx as u32, ry as u32)
}

/// Mirror an index into `0..len`, edge pixels repeated
fn reflect(index: i64, len: i64) -> i64 {
    if len <= 1 {
        return 0;
    }

    let period = 2 * len;
    let wrapped = index.rem_euclid(period);
    if wrapped < len {
        wrapped
    } else {
        period - 1 - wrapped
    }
}
