use crate::display::{DashboardFrame, DisplayDevice, DisplayError};
use chrono::NaiveTime;
use embedded_graphics::mono_font::ascii::{FONT_4X6, FONT_5X8};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

const BODY_FONT: &MonoFont<'static> = &FONT_5X8;
const BAR_FONT: &MonoFont<'static> = &FONT_4X6;

const BAR_TOP: i32 = 105;
const BAR_BOTTOM: i32 = 122;
const STATUS_ORIGIN: Point = Point::new(5, 106);
const TIME_ORIGIN: Point = Point::new(150, 106);

pub struct DashboardRenderer {
    size: Size,
}

impl DashboardRenderer {
    pub fn new(size: Size) -> Self {
        Self { size }
    }

    /// Body characters that fit on one line.
    pub fn text_columns(&self) -> usize {
        (self.size.width / BODY_FONT.character_size.width) as usize
    }

    /// Body lines that fit above the status bar.
    pub fn text_rows(&self) -> usize {
        (BAR_TOP as u32 / BODY_FONT.character_size.height) as usize
    }

    pub fn compose(&self, status_line: &str, body: Option<&str>, now: NaiveTime) -> DashboardFrame {
        let mut frame = DashboardFrame::new(self.size);

        draw(
            &mut frame,
            &Rectangle::with_corners(
                Point::new(0, BAR_TOP),
                Point::new(self.size.width as i32 - 1, BAR_BOTTOM),
            )
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On)),
        );

        if let Some(body) = body {
            draw(
                &mut frame,
                &Text::with_baseline(
                    body,
                    Point::zero(),
                    MonoTextStyle::new(BODY_FONT, BinaryColor::On),
                    Baseline::Top,
                ),
            );
        }

        let bar_style = MonoTextStyle::new(BAR_FONT, BinaryColor::Off);
        let time = format!("Updated: {}", now.format("%H:%M:%S"));
        draw(
            &mut frame,
            &Text::with_baseline(status_line, STATUS_ORIGIN, bar_style, Baseline::Top),
        );
        draw(
            &mut frame,
            &Text::with_baseline(&time, TIME_ORIGIN, bar_style, Baseline::Top),
        );

        frame
    }

    pub fn render<D: DisplayDevice>(
        &self,
        device: &mut D,
        status_line: &str,
        body: Option<&str>,
        now: NaiveTime,
    ) -> Result<(), DisplayError> {
        let frame = self.compose(status_line, body, now);
        let buffer = device.frame_buffer(&frame)?;
        device.display(&buffer)
    }
}

fn draw<T>(frame: &mut DashboardFrame, item: &T)
where
    T: Drawable<Color = BinaryColor>,
{
    if let Err(never) = item.draw(frame) {
        match never {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::RecordingDisplay;
    use crate::state::{BlockingStatus, StatusSnapshot};
    use crate::summary::build_summary;

    fn renderer() -> DashboardRenderer {
        DashboardRenderer::new(Size::new(250, 122))
    }

    fn sample_time() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 34, 56).expect("время")
    }

    fn ink_in(frame: &DashboardFrame, xs: std::ops::Range<i32>, ys: std::ops::Range<i32>) -> usize {
        ys.flat_map(|y| xs.clone().map(move |x| Point::new(x, y)))
            .filter(|p| frame.pixel(*p) == Some(BinaryColor::On))
            .count()
    }

    #[test]
    fn text_grid_fits_panel() {
        assert_eq!(renderer().text_columns(), 50);
        assert_eq!(renderer().text_rows(), 13);
    }

    #[test]
    fn summary_lines_fit_panel_width() {
        let snapshot = |queries: u64, status| StatusSnapshot {
            queries_today: queries,
            ads_blocked_today: queries / 3,
            ads_percentage_today: 0.3333,
            domains_blocked: 1_250_000,
            queries_cached: queries / 2,
            status,
        };
        let r = renderer();
        let summary = build_summary(
            &snapshot(99_999, BlockingStatus::Enabled),
            &snapshot(99_998, BlockingStatus::Disabled),
            None,
        );
        let lines: Vec<&str> = summary.body_text.lines().collect();
        assert!(lines.len() <= r.text_rows());
        for line in lines {
            assert!(
                line.chars().count() <= r.text_columns(),
                "{} символов: {line}",
                line.chars().count()
            );
        }
        let bar_char = BAR_FONT.character_size.width as usize;
        assert!(summary.status_line.chars().count() * bar_char + STATUS_ORIGIN.x as usize <= TIME_ORIGIN.x as usize);
    }

    #[test]
    fn status_bar_is_filled_below_body() {
        let frame = renderer().compose("(1) enabled / (2) enabled", None, sample_time());
        assert_eq!(frame.pixel(Point::new(245, 120)), Some(BinaryColor::On));
        assert_eq!(frame.pixel(Point::new(0, 105)), Some(BinaryColor::On));
        assert_eq!(frame.pixel(Point::new(0, 104)), Some(BinaryColor::Off));
    }

    #[test]
    fn bar_text_is_drawn_light_on_dark() {
        let frame = renderer().compose("(1) enabled / (2) enabled", None, sample_time());
        let status_area = (5..105).len() * (106..112).len();
        assert!(ink_in(&frame, 5..105, 106..112) < status_area);
        let time_area = (150..218).len() * (106..112).len();
        assert!(ink_in(&frame, 150..218, 106..112) < time_area);
    }

    #[test]
    fn missing_body_leaves_top_blank() {
        let frame = renderer().compose("Error", None, sample_time());
        assert_eq!(ink_in(&frame, 0..250, 0..BAR_TOP), 0);
    }

    #[test]
    fn body_starts_at_top_left() {
        let frame = renderer().compose(
            "(1) enabled / (2) enabled",
            Some("[+] Total Queries: 300, (1) 100 / (2) 200\n[x] Blocklist: (1) 1 / (2) 2"),
            sample_time(),
        );
        assert!(ink_in(&frame, 0..250, 0..8) > 0);
        assert!(ink_in(&frame, 0..250, 8..16) > 0);
        assert_eq!(ink_in(&frame, 0..250, 16..BAR_TOP), 0);
    }

    #[test]
    fn timestamp_changes_the_frame() {
        let r = renderer();
        let a = r.compose("s", None, sample_time());
        let b = r.compose("s", None, NaiveTime::from_hms_opt(12, 35, 0).expect("время"));
        assert_ne!(a, b);
    }

    #[test]
    fn render_hands_buffer_to_device() {
        let mut device = RecordingDisplay::new(250, 122);
        renderer()
            .render(&mut device, "(1) enabled / (2) enabled", Some("body"), sample_time())
            .expect("вывод");
        assert_eq!(device.buffers.len(), 1);
        assert_eq!(device.buffers[0].len(), 32 * 122);
    }

    #[test]
    fn render_refuses_mismatched_device() {
        let mut device = RecordingDisplay::new(122, 250);
        let err = renderer()
            .render(&mut device, "s", None, sample_time())
            .expect_err("другая геометрия");
        assert!(matches!(err, DisplayError::Geometry { .. }));
        assert!(device.buffers.is_empty());
    }
}
