/// Read access to a row-major raster with `channels()` interleaved values per pixel.
pub trait ImageView {
    type Pixel: Copy;

    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Interleaved values per pixel; scalar rasters keep the default of 1.
    fn channels(&self) -> usize {
        1
    }

    /// Row `y` as a slice of `width() * channels()` values.
    fn row(&self, y: usize) -> &[Self::Pixel];

    /// Spatial shape as `(height, width)`.
    fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// All channel values of the pixel at `(y, x)`.
    fn pixel(&self, y: usize, x: usize) -> &[Self::Pixel] {
        let c = self.channels();
        &self.row(y)[x * c..(x + 1) * c]
    }

    fn rows(&self) -> Rows<'_, Self>
    where
        Self: Sized,
    {
        Rows { image: self, y: 0 }
    }
}

pub trait ImageViewMut: ImageView {
    fn row_mut(&mut self, y: usize) -> &mut [Self::Pixel];

    /// Overwrite every value with `value`.
    fn fill(&mut self, value: Self::Pixel) {
        for y in 0..self.height() {
            self.row_mut(y).fill(value);
        }
    }
}

pub struct Rows<'a, I: ?Sized + ImageView> {
    image: &'a I,
    y: usize,
}

impl<'a, I: ImageView> Iterator for Rows<'a, I> {
    type Item = &'a [I::Pixel];

    fn next(&mut self) -> Option<Self::Item> {
        if self.y >= self.image.height() {
            return None;
        }
        let y = self.y;
        self.y += 1;
        Some(self.image.row(y))
    }
}
