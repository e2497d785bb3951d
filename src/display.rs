use crate::config::{DisplayConfig, FrameFormat};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use std::convert::Infallible;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("ошибка вывода на дисплей {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("размер кадра {actual:?} не совпадает с дисплеем {expected:?}")]
    Geometry { expected: Size, actual: Size },
}

/// Monochrome bitmap in panel coordinates. `BinaryColor::On` is ink (black).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardFrame {
    size: Size,
    ink: Vec<bool>,
}

impl DashboardFrame {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ink: vec![false; size.width as usize * size.height as usize],
        }
    }

    #[cfg(test)]
    pub fn pixel(&self, point: Point) -> Option<BinaryColor> {
        self.index(point).map(|i| BinaryColor::from(self.ink[i]))
    }

    /// Rows packed MSB first, each padded to a whole byte.
    pub fn packed_rows(&self, set_bit_for_ink: bool) -> Vec<u8> {
        let row_bytes = self.size.width.div_ceil(8) as usize;
        let mut out = vec![0_u8; row_bytes * self.size.height as usize];
        for y in 0..self.size.height as usize {
            for x in 0..self.size.width as usize {
                let ink = self.ink[y * self.size.width as usize + x];
                if ink == set_bit_for_ink {
                    out[y * row_bytes + x / 8] |= 0x80 >> (x % 8);
                }
            }
        }
        out
    }

    fn index(&self, point: Point) -> Option<usize> {
        let (x, y) = (u32::try_from(point.x).ok()?, u32::try_from(point.y).ok()?);
        (x < self.size.width && y < self.size.height)
            .then_some(y as usize * self.size.width as usize + x as usize)
    }
}

impl OriginDimensions for DashboardFrame {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for DashboardFrame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(i) = self.index(point) {
                self.ink[i] = color.is_on();
            }
        }
        Ok(())
    }
}

/// The panel driver seen from the dashboard.
pub trait DisplayDevice {
    fn size(&self) -> Size;
    fn initialize(&mut self) -> Result<(), DisplayError>;
    fn frame_buffer(&self, frame: &DashboardFrame) -> Result<Vec<u8>, DisplayError>;
    fn display(&mut self, buffer: &[u8]) -> Result<(), DisplayError>;
}

fn check_geometry(expected: Size, frame: &DashboardFrame) -> Result<(), DisplayError> {
    if frame.size != expected {
        return Err(DisplayError::Geometry {
            expected,
            actual: frame.size,
        });
    }
    Ok(())
}

/// Hands frames to a panel driver via a device node or spool file.
pub struct FileDisplay {
    size: Size,
    path: PathBuf,
    format: FrameFormat,
}

impl FileDisplay {
    pub fn new(cfg: &DisplayConfig) -> Self {
        Self {
            size: Size::new(cfg.width, cfg.height),
            path: PathBuf::from(&cfg.output_path),
            format: cfg.format,
        }
    }

    fn io_error(&self, source: std::io::Error) -> DisplayError {
        DisplayError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn spool_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
    }
}

impl DisplayDevice for FileDisplay {
    fn size(&self) -> Size {
        self.size
    }

    fn initialize(&mut self) -> Result<(), DisplayError> {
        match self.format {
            // device nodes are opened in place
            FrameFormat::Raw => fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(&self.path)
                .map(|_| ())
                .map_err(|e| self.io_error(e)),
            FrameFormat::Pbm => {
                let dir = self.spool_dir();
                if dir.is_dir() {
                    Ok(())
                } else {
                    Err(self.io_error(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("нет каталога {}", dir.display()),
                    )))
                }
            }
        }
    }

    fn frame_buffer(&self, frame: &DashboardFrame) -> Result<Vec<u8>, DisplayError> {
        check_geometry(self.size, frame)?;
        Ok(match self.format {
            FrameFormat::Raw => frame.packed_rows(false),
            FrameFormat::Pbm => {
                let mut out = format!("P4\n{} {}\n", self.size.width, self.size.height).into_bytes();
                out.extend(frame.packed_rows(true));
                out
            }
        })
    }

    fn display(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        match self.format {
            FrameFormat::Raw => fs::write(&self.path, buffer).map_err(|e| self.io_error(e)),
            FrameFormat::Pbm => {
                let mut tmp = NamedTempFile::new_in(self.spool_dir()).map_err(|e| self.io_error(e))?;
                tmp.write_all(buffer).map_err(|e| self.io_error(e))?;
                tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
                Ok(())
            }
        }
    }
}

/// Keeps every buffer it is shown.
#[cfg(test)]
pub struct RecordingDisplay {
    pub size: Size,
    pub buffers: Vec<Vec<u8>>,
}

#[cfg(test)]
impl RecordingDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            buffers: Vec::new(),
        }
    }
}

#[cfg(test)]
impl DisplayDevice for RecordingDisplay {
    fn size(&self) -> Size {
        self.size
    }

    fn initialize(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }

    fn frame_buffer(&self, frame: &DashboardFrame) -> Result<Vec<u8>, DisplayError> {
        check_geometry(self.size, frame)?;
        Ok(frame.packed_rows(false))
    }

    fn display(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        self.buffers.push(buffer.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    fn pbm_config(dir: &Path) -> DisplayConfig {
        DisplayConfig {
            width: 250,
            height: 122,
            output_path: dir.join("panel.pbm").display().to_string(),
            format: FrameFormat::Pbm,
        }
    }

    #[test]
    fn draws_within_bounds_only() {
        let mut frame = DashboardFrame::new(Size::new(10, 4));
        Pixel(Point::new(3, 1), BinaryColor::On)
            .draw(&mut frame)
            .expect("пиксель");
        Pixel(Point::new(-1, 20), BinaryColor::On)
            .draw(&mut frame)
            .expect("пиксель за границей");
        assert_eq!(frame.pixel(Point::new(3, 1)), Some(BinaryColor::On));
        assert_eq!(frame.pixel(Point::new(2, 1)), Some(BinaryColor::Off));
        assert_eq!(frame.pixel(Point::new(10, 0)), None);
    }

    #[test]
    fn packs_rows_msb_first_with_padding() {
        let mut frame = DashboardFrame::new(Size::new(10, 2));
        Rectangle::new(Point::new(0, 0), Size::new(2, 1))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut frame)
            .expect("прямоугольник");
        Pixel(Point::new(9, 1), BinaryColor::On)
            .draw(&mut frame)
            .expect("пиксель");

        assert_eq!(frame.packed_rows(true), vec![0b1100_0000, 0, 0, 0b0100_0000]);
        // white bits set, padding bits stay clear
        assert_eq!(
            frame.packed_rows(false),
            vec![0b0011_1111, 0b1100_0000, 0xff, 0b1000_0000]
        );
    }

    #[test]
    fn pbm_frame_is_written_atomically() {
        let dir = tempfile::tempdir().expect("временный каталог");
        let cfg = pbm_config(dir.path());
        let mut display = FileDisplay::new(&cfg);
        display.initialize().expect("инициализация");

        let frame = DashboardFrame::new(display.size());
        let buffer = display.frame_buffer(&frame).expect("буфер");
        display.display(&buffer).expect("вывод");

        let written = std::fs::read(&cfg.output_path).expect("файл кадра");
        assert!(written.starts_with(b"P4\n250 122\n"));
        assert_eq!(written.len(), "P4\n250 122\n".len() + 32 * 122);
    }

    #[test]
    fn raw_frame_has_panel_buffer_size() {
        let dir = tempfile::tempdir().expect("временный каталог");
        let cfg = DisplayConfig {
            format: FrameFormat::Raw,
            output_path: dir.path().join("epd0").display().to_string(),
            ..pbm_config(dir.path())
        };
        let mut display = FileDisplay::new(&cfg);
        display.initialize().expect("инициализация");
        let buffer = display
            .frame_buffer(&DashboardFrame::new(display.size()))
            .expect("буфер");
        assert_eq!(buffer.len(), 32 * 122);
        display.display(&buffer).expect("вывод");
        assert_eq!(std::fs::read(&cfg.output_path).expect("файл"), buffer);
    }

    #[test]
    fn rejects_frame_of_wrong_size() {
        let dir = tempfile::tempdir().expect("временный каталог");
        let display = FileDisplay::new(&pbm_config(dir.path()));
        let err = display
            .frame_buffer(&DashboardFrame::new(Size::new(122, 250)))
            .expect_err("кадр в портретной ориентации");
        assert!(matches!(err, DisplayError::Geometry { .. }));
    }

    #[test]
    fn initialize_fails_without_spool_directory() {
        let dir = tempfile::tempdir().expect("временный каталог");
        let mut display = FileDisplay::new(&pbm_config(&dir.path().join("missing")));
        assert!(display.initialize().is_err());
    }
}
