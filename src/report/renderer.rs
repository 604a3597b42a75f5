use std::io::BufWriter;

use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};

use crate::error::ApiError;

const PAGE_W_MM: f32 = 215.9; // Letter
const PAGE_H_MM: f32 = 279.4;
const MARGIN_MM: f32 = 17.6;
const LINE_STEP_MM: f32 = 6.3;
const WRAP_WIDTH: usize = 85;
const PT_TO_MM: f32 = 0.352_778;

/// Fully defaulted inputs for one report. Construction applies the fixed
/// placeholders, so rendering never sees an absent field.
#[derive(Debug, Clone)]
pub struct ReportFields {
    pub patient_name: String,
    pub age_sex: String,
    pub ref_by: String,
    pub date: String,
    pub xray_no: String,
    pub exam_title: String,
    pub findings: String,
    pub conclusion: String,
    pub advice: String,
}

/// Placeholder substitution: `None` and blank strings both count as absent.
pub fn or_placeholder(value: Option<String>, placeholder: &str) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s,
        _ => placeholder.to_string(),
    }
}

/// Derives the artifact filename from the x-ray number, keeping only
/// alphanumerics, `-` and `_`; an empty remainder falls back to "Unknown".
pub fn report_filename(xray_no: &str) -> String {
    let safe: String = xray_no
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    if safe.is_empty() {
        "Report_Unknown.pdf".to_string()
    } else {
        format!("Report_{safe}.pdf")
    }
}

/// Renders the fixed single-page layout and returns the PDF bytes. Every
/// drawing or encoding failure comes back as a descriptive `RenderFailure`.
pub fn render_report(f: &ReportFields) -> Result<Vec<u8>, ApiError> {
    let (doc, page1, layer1) =
        PdfDocument::new("Chest X-Ray Report", Mm(PAGE_W_MM), Mm(PAGE_H_MM), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);

    let helv = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_err)?;
    let oblique = doc
        .add_builtin_font(BuiltinFont::HelveticaOblique)
        .map_err(render_err)?;
    let bold_oblique = doc
        .add_builtin_font(BuiltinFont::HelveticaBoldOblique)
        .map_err(render_err)?;

    layer.set_outline_thickness(0.4);

    draw_centered(&layer, &bold, "X-RAYS REPORTING FORMATE", 16.0, 264.5, true);

    // patient metadata block, labels left and mid-page
    layer.use_text("PATIENT NAME:", 11.0, Mm(MARGIN_MM), Mm(247.0), &bold_oblique);
    layer.use_text("AGE / SEX:", 11.0, Mm(123.0), Mm(247.0), &bold_oblique);
    layer.use_text("REF. BY DR     :", 11.0, Mm(MARGIN_MM), Mm(238.0), &bold_oblique);
    layer.use_text("DATE:", 11.0, Mm(123.0), Mm(238.0), &bold_oblique);
    layer.use_text("X-RAY NO        :", 11.0, Mm(MARGIN_MM), Mm(229.5), &bold_oblique);

    layer.use_text(&f.patient_name, 11.0, Mm(56.5), Mm(247.0), &helv);
    layer.use_text(&f.age_sex, 11.0, Mm(151.5), Mm(247.0), &helv);
    layer.use_text(&f.ref_by, 11.0, Mm(56.5), Mm(238.0), &helv);
    layer.use_text(&f.date, 11.0, Mm(151.5), Mm(238.0), &helv);
    layer.use_text(&f.xray_no, 11.0, Mm(56.5), Mm(229.5), &helv);

    draw_centered(&layer, &bold_oblique, &f.exam_title, 14.0, 211.5, true);

    let mut y = 197.5_f32;

    layer.use_text("Findings:", 12.0, Mm(MARGIN_MM), Mm(y), &bold);
    underline(&layer, MARGIN_MM, y - 0.8, text_width_mm("Findings:", 12.0));
    y -= 8.8;
    for line in wrap_text(&f.findings, WRAP_WIDTH) {
        layer.use_text(&line, 11.0, Mm(MARGIN_MM), Mm(y), &oblique);
        y -= LINE_STEP_MM;
    }
    y -= 3.5;

    for line in wrap_text(&format!("Conclusion: {}", f.conclusion), WRAP_WIDTH) {
        layer.use_text(&line, 11.0, Mm(MARGIN_MM), Mm(y), &bold);
        y -= LINE_STEP_MM;
    }
    y -= 3.5;

    for line in wrap_text(&format!("Adv: {}", f.advice), WRAP_WIDTH) {
        layer.use_text(&line, 11.0, Mm(MARGIN_MM), Mm(y), &bold_oblique);
        y -= LINE_STEP_MM;
    }

    y -= 14.0;
    layer.use_text("THANKS FOR THE REFERAL,", 12.0, Mm(MARGIN_MM), Mm(y), &bold_oblique);

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf).map_err(render_err)?;
    buf.into_inner().map_err(render_err)
}

fn render_err<E: std::fmt::Display>(e: E) -> ApiError {
    ApiError::RenderFailure(e.to_string())
}

/// Approximate width of builtin Helvetica text. The builtin fonts carry no
/// metrics here, so centering uses an average glyph factor; the layout stays
/// deterministic.
fn text_width_mm(text: &str, size_pt: f32) -> f32 {
    text.chars().count() as f32 * size_pt * 0.5 * PT_TO_MM
}

fn draw_centered(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    size: f32,
    y: f32,
    underlined: bool,
) {
    let w = text_width_mm(text, size);
    let x = ((PAGE_W_MM - w) / 2.0).max(MARGIN_MM);
    layer.use_text(text, size, Mm(x), Mm(y), font);
    if underlined {
        underline(layer, x, y - 0.8, w);
    }
}

fn underline(layer: &PdfLayerReference, x: f32, y: f32, w: f32) {
    let line = Line {
        points: vec![
            (Point::new(Mm(x), Mm(y)), false),
            (Point::new(Mm(x + w), Mm(y)), false),
        ],
        is_closed: false,
    };
    layer.add_line(line);
}

/// Word-wrap at a fixed character width.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
