use ndarray::ArrayView3;

/// A decoded video frame or photo: contiguous RGB bytes in row-major order.
///
/// Pixel format conversion happens in the readers; everything downstream
/// sees tightly packed 3-channel data.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Position of this frame in decode order (0 for still images).
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                self.channels as usize,
            ),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Copies the square around the box center whose side is the longer box
    /// edge, clamped to the frame. Returns `None` if nothing is left after
    /// clamping.
    pub fn square_crop(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> Option<Frame> {
        let fw = self.width as i64;
        let fh = self.height as i64;

        let cx = ((x1 + x2) / 2.0).round() as i64;
        let cy = ((y1 + y2) / 2.0).round() as i64;
        let half = ((x2 - x1).max(y2 - y1) / 2.0).round() as i64;

        let left = (cx - half).clamp(0, fw) as usize;
        let top = (cy - half).clamp(0, fh) as usize;
        let right = (cx + half).clamp(0, fw) as usize;
        let bottom = (cy + half).clamp(0, fh) as usize;
        if right <= left || bottom <= top {
            return None;
        }

        let channels = self.channels as usize;
        let row_bytes = self.width as usize * channels;
        let mut data = Vec::with_capacity((right - left) * (bottom - top) * channels);
        for row in top..bottom {
            let start = row * row_bytes + left * channels;
            let end = row * row_bytes + right * channels;
            data.extend_from_slice(&self.data[start..end]);
        }

        Some(Frame::new(
            data,
            (right - left) as u32,
            (bottom - top) as u32,
            self.channels,
            self.index,
        ))
    }
}
