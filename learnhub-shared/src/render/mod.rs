/// Document rendering
///
/// - `certificate_pdf`: single-page PDF for an issued certificate

pub mod certificate_pdf;

pub use certificate_pdf::render_certificate_pdf;
