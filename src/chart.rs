use std::path::Path;

use eyre::Result;
use plotters::prelude::*;
use plotters::style::FontStyle;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::normalize::{FORMAT_ORDER, GroupedResults};

const LIBRARY_COLORS: &[(&str, RGBColor)] = &[
    ("fpcap (mmap)", RGBColor(0xee, 0x4d, 0x2e)),
    ("fpcap (fread)", RGBColor(0xee, 0x4d, 0x2e)),
    ("libpcap", RGBColor(0xaa, 0xaa, 0xaa)),
    ("PcapPlusPlus", RGBColor(0x77, 0x77, 0x77)),
];
const FALLBACK_COLOR: RGBColor = RGBColor(0x99, 0x99, 0x99);

const CHART_TITLE: &str = "Reading 4631 Packets (3.7mb)";
const X_AXIS_LABEL: &str = "Time (ms) — lower is better";

// Vertical layout in data units. Bars sit one BAR_ROW apart and fill 85%
// of their row; format groups are separated by GROUP_GAP.
const BAR_ROW: f64 = 0.6;
const BAR_FILL: f64 = 0.85;
const GROUP_GAP: f64 = 1.0;

fn library_color(library: &str) -> RGBColor {
    LIBRARY_COLORS
        .iter()
        .find(|(name, _)| *name == library)
        .map(|(_, color)| *color)
        .unwrap_or(FALLBACK_COLOR)
}

/// Formats in display order: the preferred list first (restricted to
/// formats actually present), then any remaining formats in encounter
/// order.
pub fn display_order(grouped: &GroupedResults) -> Vec<&str> {
    let mut formats: Vec<&str> = FORMAT_ORDER
        .iter()
        .copied()
        .filter(|format| grouped.get(format).is_some())
        .collect();
    for group in grouped.groups() {
        if !FORMAT_ORDER.contains(&group.format.as_str()) {
            formats.push(&group.format);
        }
    }
    formats
}

/// All libraries in first-encounter order, scanning formats in display
/// order, deduplicated globally.
pub fn library_order<'a>(grouped: &'a GroupedResults, formats: &[&str]) -> Vec<&'a str> {
    let mut libraries = Vec::new();
    for format in formats {
        if let Some(group) = grouped.get(format) {
            for (library, _) in &group.entries {
                if !libraries.contains(&library.as_str()) {
                    libraries.push(library.as_str());
                }
            }
        }
    }
    libraries
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub y: f64,
    pub time_ms: f64,
    pub library: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupTitle {
    pub y: f64,
    pub format: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub bars: Vec<Bar>,
    pub titles: Vec<GroupTitle>,
    pub y_top: f64,
}

/// Computes bar and group-title positions, bottom-up. Format groups are
/// laid out in reverse display order and libraries in reverse global
/// order, so the first format and its first library end up at the top of
/// the rendered chart.
pub fn compute_layout(grouped: &GroupedResults) -> Layout {
    let formats = display_order(grouped);
    let libraries = library_order(grouped, &formats);

    let mut layout = Layout::default();
    let mut y_offset = 0.0;
    for format in formats.iter().rev() {
        let Some(group) = grouped.get(format) else {
            continue;
        };
        let libs: Vec<&str> = libraries
            .iter()
            .copied()
            .filter(|library| group.time_for(library).is_some())
            .collect();

        for (i, library) in libs.iter().rev().enumerate() {
            if let Some(time_ms) = group.time_for(library) {
                layout.bars.push(Bar {
                    y: y_offset + i as f64 * BAR_ROW,
                    time_ms,
                    library: (*library).to_owned(),
                });
            }
        }

        let group_top = y_offset + libs.len().saturating_sub(1) as f64 * BAR_ROW;
        layout.titles.push(GroupTitle {
            y: group_top,
            format: (*format).to_owned(),
        });
        y_offset += libs.len() as f64 * BAR_ROW + GROUP_GAP;
    }
    layout.y_top = y_offset;
    layout
}

/// Draws the grouped horizontal bar chart and writes it as a PNG.
pub fn render(grouped: &GroupedResults, output_path: &Path) -> Result<()> {
    let layout = compute_layout(grouped);

    let width = 1500u32;
    let height = (layout.bars.len() as u32 * 60).max(600);

    let max_ms = layout
        .bars
        .iter()
        .map(|bar| bar.time_ms)
        .fold(0.0f64, f64::max);
    let x_max = (max_ms * 1.15).max(1.0);

    let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(CHART_TITLE, ("sans-serif", 32))
        .margin(20)
        .margin_left(240)
        .x_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, -0.5..layout.y_top)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .y_labels(0)
        .x_desc(X_AXIS_LABEL)
        .label_style(("sans-serif", 18))
        .axis_desc_style(("sans-serif", 22))
        .draw()?;

    let half = BAR_ROW * BAR_FILL / 2.0;
    for bar in &layout.bars {
        chart.draw_series(std::iter::once(Rectangle::new(
            [(0.0, bar.y - half), (bar.time_ms, bar.y + half)],
            library_color(&bar.library).filled(),
        )))?;
        chart.draw_series(std::iter::once(Text::new(
            format!("{:.2} ms", bar.time_ms),
            (bar.time_ms + x_max * 0.005, bar.y),
            ("sans-serif", 16)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Left, VPos::Center)),
        )))?;
    }

    // Library labels and bold group titles sit in the left margin, so
    // they are drawn on the root area at backend coordinates.
    let label_style = ("sans-serif", 18)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Right, VPos::Center));
    for bar in &layout.bars {
        let (px, py) = chart.backend_coord(&(0.0, bar.y));
        root.draw(&Text::new(bar.library.clone(), (px - 10, py), label_style.clone()))?;
    }

    let title_style = ("sans-serif", 20)
        .into_font()
        .style(FontStyle::Bold)
        .color(&BLACK)
        .pos(Pos::new(HPos::Right, VPos::Bottom));
    for title in &layout.titles {
        let (px, py) = chart.backend_coord(&(0.0, title.y));
        root.draw(&Text::new(
            title.format.clone(),
            (px - 10, py - 28),
            title_style.clone(),
        ))?;
    }

    root.present()?;
    println!("Chart saved to {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GroupedResults {
        let mut grouped = GroupedResults::default();
        grouped.insert("pcap", "fpcap (mmap)", 1.0);
        grouped.insert("pcap", "libpcap", 2.0);
        grouped.insert("pcapng", "libpcap", 3.0);
        grouped
    }

    #[test]
    fn preferred_formats_come_first_in_fixed_order() {
        let mut grouped = GroupedResults::default();
        grouped.insert("exotic", "libpcap", 1.0);
        grouped.insert("pcapng.zst(d)", "libpcap", 1.0);
        grouped.insert("pcap", "libpcap", 1.0);
        grouped.insert("another", "libpcap", 1.0);

        assert_eq!(
            display_order(&grouped),
            vec!["pcap", "pcapng.zst(d)", "exotic", "another"]
        );
    }

    #[test]
    fn libraries_keep_first_encounter_order_across_formats() {
        let grouped = sample();
        let formats = display_order(&grouped);
        assert_eq!(
            library_order(&grouped, &formats),
            vec!["fpcap (mmap)", "libpcap"]
        );
    }

    #[test]
    fn unknown_library_gets_the_fallback_color() {
        assert_eq!(library_color("fpcap (mmap)"), RGBColor(0xee, 0x4d, 0x2e));
        assert_eq!(library_color("somethingelse"), FALLBACK_COLOR);
    }

    #[test]
    fn layout_places_first_format_topmost() {
        let layout = compute_layout(&sample());

        // pcapng renders first (bottom), pcap last (top).
        assert_eq!(layout.bars.len(), 3);
        assert_eq!(layout.bars[0].library, "libpcap");
        assert_eq!(layout.bars[0].y, 0.0);
        assert_eq!(layout.bars[0].time_ms, 3.0);

        // Within pcap, libpcap sits below fpcap (mmap).
        assert_eq!(layout.bars[1].library, "libpcap");
        assert_eq!(layout.bars[1].y, 1.6);
        assert_eq!(layout.bars[2].library, "fpcap (mmap)");
        assert_eq!(layout.bars[2].y, 2.2);

        // One title per group, above its topmost bar.
        assert_eq!(layout.titles.len(), 2);
        assert_eq!(layout.titles[0].format, "pcapng");
        assert_eq!(layout.titles[0].y, 0.0);
        assert_eq!(layout.titles[1].format, "pcap");
        assert_eq!(layout.titles[1].y, 2.2);

        assert_eq!(layout.y_top, 3.8);
    }

    #[test]
    fn empty_grouping_yields_empty_layout() {
        let layout = compute_layout(&GroupedResults::default());
        assert!(layout.bars.is_empty());
        assert!(layout.titles.is_empty());
        assert_eq!(layout.y_top, 0.0);
    }
}
