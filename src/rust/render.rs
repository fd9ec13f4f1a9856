//! Plain-text rendering of classification reports for terminals.

use std::fmt::Write;

use crate::batch::BatchEntry;
use crate::report::ClassificationReport;

const BAR_WIDTH: usize = 20;

/// A fixed-width bar for a score in `[0, 1]`. Out-of-range scores are clamped.
pub fn progress_bar(score: f32, width: usize) -> String {
    let filled = if score.is_finite() {
        (score.clamp(0.0, 1.0) * width as f32).round() as usize
    } else {
        0
    };
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Renders one report: the top prediction first, then the ranked list with bars.
///
/// ```text
/// Image 1
///   🐶 golden retriever (92.00%)
///   ---
///   Top 3 predictions:
///   1. 🐶 golden retriever   92.0% [##################--]
/// ```
pub fn render_report(report: &ClassificationReport) -> String {
    let mut out = String::new();
    let top = report.top_result();

    // writing to a String cannot fail
    let _ = writeln!(out, "Image {}", report.source_index());
    let _ = writeln!(out, "  {} {} ({:.2}%)", top.glyph(), top.label(), top.score() * 100.0);
    let _ = writeln!(out, "  ---");
    let _ = writeln!(out, "  Top {} predictions:", report.len());

    let label_width = report
        .ranked()
        .iter()
        .map(|r| r.label().chars().count())
        .max()
        .unwrap_or(0);
    for (i, result) in report.ranked().iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {} {:<width$} {:>5.1}% {}",
            i + 1,
            result.glyph(),
            result.label(),
            result.score() * 100.0,
            progress_bar(result.score(), BAR_WIDTH),
            width = label_width
        );
    }
    out
}

/// Renders a batch slot; failures become a single error line.
pub fn render_entry(entry: &BatchEntry) -> String {
    match entry {
        BatchEntry::Classified(report) => render_report(report),
        BatchEntry::Failed { source_index, error } => {
            format!("Image {}\n  failed: {}\n", source_index, error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassificationPipeline, ClassifierError, InferenceEngine};
    use crate::report::Prediction;
    use image::DynamicImage;
    use std::sync::Arc;

    struct Fixed;

    impl InferenceEngine for Fixed {
        fn infer(&self, _: &DynamicImage, _: usize) -> Result<Vec<Prediction>, ClassifierError> {
            Ok(vec![
                Prediction::new("Golden Retriever", 0.92),
                Prediction::new("Labrador", 0.05),
                Prediction::new("quasar", 0.01),
            ])
        }
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 4), "[----]");
        assert_eq!(progress_bar(0.5, 4), "[##--]");
        assert_eq!(progress_bar(1.0, 4), "[####]");
        assert_eq!(progress_bar(3.0, 4), "[####]");
        assert_eq!(progress_bar(f32::NAN, 4), "[----]");
    }

    #[test]
    fn test_render_report() {
        let pipeline = ClassificationPipeline::new(Arc::new(Fixed));
        let report = pipeline.classify(&DynamicImage::new_rgb8(1, 1), 5).unwrap();
        let text = render_report(&report);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Image 1");
        assert_eq!(lines[1], "  🐶 Golden Retriever (92.00%)");
        assert_eq!(lines[3], "  Top 3 predictions:");
        assert!(lines[4].starts_with("  1. 🐶 Golden Retriever"));
        assert!(lines[4].contains("92.0%"));
        assert!(lines[6].starts_with("  3. 🔍 quasar"));
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_render_failed_entry() {
        let entry = BatchEntry::Failed {
            source_index: 2,
            error: ClassifierError::InvalidImage("truncated PNG".into()),
        };
        assert_eq!(render_entry(&entry), "Image 2\n  failed: Invalid image: truncated PNG\n");
    }
}
