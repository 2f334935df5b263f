use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{AnalysisError, Result};

/// Upper bound on the pixels a single chart may allocate (about 48 MB RGB).
pub const MAX_PIXELS: u64 = 16_000_000;

/// Off-screen RGB buffer: plotters draws into it, `image` encodes it.
pub struct Raster {
    width: u32,
    height: u32,
    buf: Vec<u8>,
}

impl Raster {
    /// Allocate a white `width × height` buffer for `chart`.
    ///
    /// Oversized or unallocatable images are a render error for that chart
    /// only.
    pub fn new(chart: &str, width: u32, height: u32) -> Result<Self> {
        let (width, height) = (width.max(1), height.max(1));
        let pixels = u64::from(width) * u64::from(height);
        if pixels > MAX_PIXELS {
            return Err(AnalysisError::render(
                chart,
                format!("{width}x{height} image exceeds the {MAX_PIXELS} pixel limit"),
            ));
        }
        let len = pixels as usize * 3;
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|e| AnalysisError::render(chart, e))?;
        buf.resize(len, 255);
        Ok(Raster { width, height, buf })
    }

    #[cfg(test)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[cfg(test)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[cfg(test)]
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Drawing area over the whole buffer.
    pub fn root(&mut self) -> DrawingArea<BitMapBackend<'_>, Shift> {
        BitMapBackend::with_buffer(&mut self.buf, (self.width, self.height)).into_drawing_area()
    }

    pub fn save_png(&self, path: &Path, chart: &str) -> Result<()> {
        image::save_buffer_with_format(
            path,
            &self.buf,
            self.width,
            self.height,
            image::ColorType::Rgb8,
            image::ImageFormat::Png,
        )
        .map_err(|e| AnalysisError::render(chart, e))
    }
}
