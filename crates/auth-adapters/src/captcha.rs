//! Distorted-text captcha from the `captcha` crate, scaled down to the
//! picture size the front end expects.

use std::io::Cursor;

use captcha::filters::{Dots, Noise, Wave};
use captcha::Captcha;
use domains::{CaptchaGenerator, CaptchaImage, DomainError, Result};
use image::imageops::FilterType;
use image::ImageFormat;

pub const WIDTH: u32 = 100;
pub const HEIGHT: u32 = 35;

// Canvas the text is drawn on before scaling.
const VIEW_WIDTH: u32 = 220;
const VIEW_HEIGHT: u32 = 90;

pub struct DistortedCaptcha {
    length: u32,
}

impl Default for DistortedCaptcha {
    fn default() -> Self {
        Self { length: 5 }
    }
}

impl DistortedCaptcha {
    /// `length` is clamped so the code always fits the picture.
    pub fn new(length: usize) -> Self {
        Self { length: length.clamp(4, 6) as u32 }
    }
}

impl CaptchaGenerator for DistortedCaptcha {
    fn generate(&self) -> Result<CaptchaImage> {
        let mut captcha = Captcha::new();
        captcha
            .add_chars(self.length)
            .apply_filter(Noise::new(0.3))
            .apply_filter(Wave::new(2.0, 12.0).horizontal())
            .apply_filter(Wave::new(2.0, 12.0).vertical())
            .view(VIEW_WIDTH, VIEW_HEIGHT)
            .apply_filter(Dots::new(6));
        let (code, drawn) = captcha
            .as_tuple()
            .ok_or_else(|| DomainError::internal("captcha image could not be encoded"))?;

        let small = image::load_from_memory(&drawn)
            .map_err(DomainError::internal)?
            .resize_exact(WIDTH, HEIGHT, FilterType::Triangle);
        let mut png = Cursor::new(Vec::new());
        small.write_to(&mut png, ImageFormat::Png).map_err(DomainError::internal)?;
        Ok(CaptchaImage { code, png: png.into_inner() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_has_requested_length() {
        let image = DistortedCaptcha::new(4).generate().unwrap();
        assert_eq!(image.code.chars().count(), 4);
        assert!(image.code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(DistortedCaptcha::new(40).generate().unwrap().code.chars().count(), 6);
    }

    #[test]
    fn renders_png_of_fixed_size() {
        let image = DistortedCaptcha::default().generate().unwrap();
        assert_eq!(&image.png[1..4], b"PNG");
        let decoded = image::load_from_memory(&image.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (WIDTH, HEIGHT));
    }

    #[test]
    fn every_call_draws_a_new_code() {
        let captcha = DistortedCaptcha::default();
        let codes: std::collections::HashSet<String> =
            (0..5).map(|_| captcha.generate().unwrap().code).collect();
        assert!(codes.len() > 1);
    }
}
