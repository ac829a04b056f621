#![cfg(not(tarpaulin_include))]
#![cfg(feature = "web")]
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use plotters::prelude::*;

use crate::models::{StoreAggregate, WeekAggregate};

/// Gross-margin bands used to color bars, matching the planning grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GmBand {
    /// 84% and above
    Excellent,
    /// 40% to 84%
    Strong,
    /// 20% to 40%
    Fair,
    /// 10% to 20%
    Weak,
    /// below 10%
    Poor,
}

impl GmBand {
    pub fn of(gm_percent: f64) -> Self {
        if gm_percent >= 84.0 {
            GmBand::Excellent
        } else if gm_percent >= 40.0 {
            GmBand::Strong
        } else if gm_percent >= 20.0 {
            GmBand::Fair
        } else if gm_percent >= 10.0 {
            GmBand::Weak
        } else {
            GmBand::Poor
        }
    }

    pub fn color(self) -> RGBColor {
        match self {
            GmBand::Excellent => RGBColor(0x00, 0x80, 0x00),
            GmBand::Strong => RGBColor(0x32, 0xCD, 0x32),
            GmBand::Fair => RGBColor(0xFF, 0xD7, 0x00),
            GmBand::Weak => RGBColor(0xFF, 0xA5, 0x00),
            GmBand::Poor => RGBColor(0xFF, 0x00, 0x00),
        }
    }
}

/// Configuration options for chart generation
#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// Title displayed at the top of the graph
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the graph in pixels
    pub width: u32,

    /// Height of the graph in pixels
    pub height: u32,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            title: "Gross Margin".to_string(),
            x_label: "Week".to_string(),
            y_label: "GM Dollars".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Render one store's weekly GM dollars as a PNG bar chart.
///
/// Each bar is colored by the week's GM% band.
///
/// # Returns
/// * PNG image bytes, or an error from drawing or encoding
pub fn create_gm_bar_graph(
    aggregate: &StoreAggregate,
    options: &GraphOptions,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let (width, height) = (options.width, options.height);
    let mut pixels = vec![0u8; width as usize * height as usize * 3];

    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let weeks = &aggregate.weeks;
        let (min_y, max_y) = value_range(weeks);
        let slots = weeks.len().max(1) as i32;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d((0..slots).into_segmented(), min_y..max_y)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(weeks.len().max(1))
            .x_label_formatter(&|x| match x {
                SegmentValue::CenterOf(i) => weeks
                    .get(*i as usize)
                    .map(|w| w.week.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .draw()?;

        chart.draw_series(weeks.iter().enumerate().map(|(i, week)| {
            let x = i as i32;
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(x), 0.0),
                    (SegmentValue::Exact(x + 1), week.gm_dollars),
                ],
                GmBand::of(week.gm_percent).color().filled(),
            );
            bar.set_margin(0, 0, 5, 5);
            bar
        }))?;

        root.present()?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(&pixels, width, height, ColorType::Rgb8)?;
    Ok(png)
}

/// Y range covering every bar and the zero line, with headroom above.
fn value_range(weeks: &[WeekAggregate]) -> (f64, f64) {
    let min = weeks.iter().map(|w| w.gm_dollars).fold(0.0, f64::min);
    let max = weeks.iter().map(|w| w.gm_dollars).fold(0.0, f64::max);
    if max - min <= f64::EPSILON {
        return (min, min + 1.0);
    }
    let pad = (max - min) * 0.1;
    (if min < 0.0 { min - pad } else { min }, max + pad)
}
