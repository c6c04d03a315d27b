/// Certificate PDF rendering
///
/// Produces a landscape A4, single-page PDF 1.4 document using the built-in
/// Helvetica fonts, so no font files are embedded. The layout is a fixed set
/// of centred text lines inside a double border.
///
/// The writer tracks byte offsets of each object to emit a valid
/// cross-reference table; text is restricted to printable ASCII and
/// anything else is replaced with `?`.

use bytes::Bytes;

use crate::models::certificate::CertificateDetails;

const PAGE_WIDTH: f32 = 842.0;
const PAGE_HEIGHT: f32 = 595.0;

/// Approximate Helvetica advance width as a fraction of the font size
const AVG_GLYPH_WIDTH: f32 = 0.5;

struct Line {
    font: &'static str,
    size: f32,
    y: f32,
    text: String,
}

/// Renders `details` as a PDF issued by `portal_name`
pub fn render_certificate_pdf(details: &CertificateDetails, portal_name: &str) -> Bytes {
    let mut lines = vec![
        Line {
            font: "F2",
            size: 36.0,
            y: 470.0,
            text: "Certificate of Completion".to_string(),
        },
        Line {
            font: "F1",
            size: 16.0,
            y: 420.0,
            text: "This certifies that".to_string(),
        },
        Line {
            font: "F2",
            size: 28.0,
            y: 375.0,
            text: details.user_name.clone(),
        },
    ];

    if let Some(department) = details.department.as_deref().filter(|d| !d.trim().is_empty()) {
        lines.push(Line {
            font: "F1",
            size: 14.0,
            y: 350.0,
            text: department.to_string(),
        });
    }

    lines.extend([
        Line {
            font: "F1",
            size: 16.0,
            y: 310.0,
            text: "has successfully completed the course".to_string(),
        },
        Line {
            font: "F2",
            size: 24.0,
            y: 270.0,
            text: details.course_title.clone(),
        },
        Line {
            font: "F1",
            size: 14.0,
            y: 200.0,
            text: format!("Issued on {}", details.issued_at.format("%B %-d, %Y")),
        },
        Line {
            font: "F1",
            size: 12.0,
            y: 130.0,
            text: format!("Certificate ID: {}", details.certificate_id),
        },
        Line {
            font: "F1",
            size: 10.0,
            y: 110.0,
            text: portal_name.to_string(),
        },
    ]);

    Bytes::from(write_document(&content_stream(&lines)))
}

fn content_stream(lines: &[Line]) -> String {
    let mut stream = String::new();

    // Outer and inner border
    stream.push_str("0.2 0.3 0.5 RG\n3 w\n20 20 802 555 re S\n1 w\n30 30 782 535 re S\n");
    stream.push_str("0 0 0 rg\n");

    for line in lines {
        let text = escape_text(&line.text);
        let width = line.text.chars().count() as f32 * line.size * AVG_GLYPH_WIDTH;
        let x = ((PAGE_WIDTH - width) / 2.0).max(40.0);
        stream.push_str(&format!(
            "BT /{} {:.1} Tf {:.1} {:.1} Td ({}) Tj ET\n",
            line.font, line.size, x, line.y, text
        ));
    }

    stream
}

/// Escapes a string for a PDF literal string
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' '..='~' => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}

fn write_document(stream: &str) -> Vec<u8> {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 5 0 R /F2 6 0 R >> >> /Contents 4 0 R >>",
            PAGE_WIDTH, PAGE_HEIGHT
        ),
        format!("<< /Length {} >>\nstream\n{}endstream", stream.len(), stream),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold >>".to_string(),
    ];

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", index + 1, body).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn details() -> CertificateDetails {
        CertificateDetails {
            certificate_id: "CERT-1709294400000-0042".to_string(),
            user_id: Uuid::new_v4(),
            user_name: "Asha Rao".to_string(),
            department: Some("Operations".to_string()),
            course_id: Uuid::new_v4(),
            course_title: "Blast Furnace Safety (Level 2)".to_string(),
            issued_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn render() -> String {
        let pdf = render_certificate_pdf(&details(), "LearnHub");
        String::from_utf8(pdf.to_vec()).unwrap()
    }

    #[test]
    fn test_document_framing() {
        let pdf = render();
        assert!(pdf.starts_with("%PDF-1.4\n"));
        assert!(pdf.ends_with("%%EOF\n"));
        assert!(pdf.contains("/Count 1"));
    }

    #[test]
    fn test_contains_certificate_fields() {
        let pdf = render();
        assert!(pdf.contains("(Asha Rao)"));
        assert!(pdf.contains("(Operations)"));
        assert!(pdf.contains("(Certificate ID: CERT-1709294400000-0042)"));
        assert!(pdf.contains("(Issued on March 1, 2024)"));
        assert!(pdf.contains("(LearnHub)"));
    }

    #[test]
    fn test_parentheses_are_escaped() {
        assert!(render().contains("(Blast Furnace Safety \\(Level 2\\))"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let pdf = render();
        let xref_at: usize = pdf
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|n| n.parse().ok())
            .unwrap();
        assert!(pdf[xref_at..].starts_with("xref\n"));

        let entries: Vec<usize> = pdf[xref_at..]
            .lines()
            .skip(3)
            .take(6)
            .map(|line| line[..10].parse().unwrap())
            .collect();
        for (index, offset) in entries.iter().enumerate() {
            assert!(pdf[*offset..].starts_with(&format!("{} 0 obj", index + 1)));
        }
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a\\b"), "a\\\\b");
        assert_eq!(escape_text("Zoë"), "Zo?");
    }

    #[test]
    fn test_missing_department_is_skipped() {
        let mut d = details();
        d.department = None;
        let pdf = String::from_utf8(render_certificate_pdf(&d, "LearnHub").to_vec()).unwrap();
        assert!(!pdf.contains("(Operations)"));
    }
}
