//! Metadata overlay printed on exported posters.
//!
//! Four monospace labels sit in the corners, 20 units in from each edge at
//! the export scale: the brand top-left, the date top-right, the seed
//! bottom-left and the editor name bottom-right.

use std::fmt;

use chrono::{Local, NaiveDate};
use poster_core::RenderSnapshot;

use crate::color::Rgba;
use crate::patterns::background_color;
use crate::surface::{HAlign, Surface, TextStyle, VAlign};

/// Brand printed top-left.
pub const BRAND: &str = "Program.A";

/// Distance from the edges in design units.
const MARGIN: f64 = 20.0;

/// Calendar date printed on a poster, shown as `DD/MM/YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosterDate(pub NaiveDate);

impl PosterDate {
    /// A fixed date. `None` if it does not exist.
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Today's date in the local time zone.
    #[must_use]
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }
}

impl fmt::Display for PosterDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%d/%m/%Y"))
    }
}

/// Draw the four corner labels for `snapshot` at scale `k`.
///
/// The text colour is whichever of black or white contrasts with the
/// family's background.
pub fn draw_overlay<S: Surface + ?Sized>(
    surface: &mut S,
    snapshot: &RenderSnapshot,
    date: PosterDate,
    k: f64,
) {
    let color: Rgba = background_color(&snapshot.params).contrasting();
    let (w, h) = (surface.width(), surface.height());
    let margin = MARGIN * k;

    surface.push();
    surface.no_stroke();
    surface.fill(color);
    surface.text(
        BRAND,
        margin,
        margin,
        &TextStyle::new(16.0 * k, HAlign::Left, VAlign::Top),
    );
    surface.text(
        &date.to_string(),
        w - margin,
        margin,
        &TextStyle::new(12.0 * k, HAlign::Right, VAlign::Top),
    );
    surface.text(
        &snapshot.seed.label(),
        margin,
        h - margin,
        &TextStyle::new(10.0 * k, HAlign::Left, VAlign::Bottom),
    );
    surface.text(
        &snapshot.kind().as_str().to_uppercase(),
        w - margin,
        h - margin,
        &TextStyle::new(14.0 * k, HAlign::Right, VAlign::Bottom),
    );
    surface.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawOp, RecordingSurface};
    use poster_core::{EditorKind, PatternParams, Seed};

    #[test]
    fn dates_print_day_first() {
        let leap = PosterDate::from_ymd(2024, 2, 29).expect("date");
        assert_eq!(leap.to_string(), "29/02/2024");
        assert_eq!(PosterDate::from_ymd(2000, 12, 31).expect("date").to_string(), "31/12/2000");
        assert!(PosterDate::from_ymd(2023, 2, 29).is_none());
    }

    #[test]
    fn today_follows_the_local_calendar() {
        let before = Local::now().date_naive();
        let today = PosterDate::today();
        let after = Local::now().date_naive();
        assert!(today.0 == before || today.0 == after);
    }

    #[test]
    fn labels_sit_in_the_corners() {
        let snapshot = RenderSnapshot::new(Seed::parse("alpha"), PatternParams::defaults(EditorKind::Griglie));
        let date = PosterDate::from_ymd(2025, 3, 7).expect("date");
        let mut surface = RecordingSurface::new(1000, 1500);
        draw_overlay(&mut surface, &snapshot, date, 2.0);
        let texts: Vec<(String, (f64, f64), f64)> = surface
            .list()
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, at, size, .. } => Some((text.clone(), *at, *size)),
                _ => None,
            })
            .collect();
        assert_eq!(
            texts,
            vec![
                ("Program.A".to_string(), (40.0, 40.0), 32.0),
                ("07/03/2025".to_string(), (960.0, 40.0), 24.0),
                ("alpha".to_string(), (40.0, 1460.0), 20.0),
                ("GRIGLIE".to_string(), (960.0, 1460.0), 28.0),
            ]
        );
    }

    #[test]
    fn text_contrasts_with_background() {
        let snapshot = RenderSnapshot::new(Seed::from_value(1), PatternParams::defaults(EditorKind::Moire));
        let mut surface = RecordingSurface::new(600, 900);
        draw_overlay(&mut surface, &snapshot, PosterDate::today(), 1.0);
        let DrawOp::Text { color, .. } = &surface.list().ops[0] else {
            panic!("expected text");
        };
        assert_eq!(*color, Some(Rgba::BLACK));
    }
}
