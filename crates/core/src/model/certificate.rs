use chrono::{DateTime, Utc};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CertificateError {
    #[error("student name cannot be empty")]
    EmptyStudentName,

    #[error("course title cannot be empty")]
    EmptyCourseTitle,

    #[error("course is not complete yet ({percentage}%)")]
    NotEligible { percentage: u8 },
}

//
// ─── CERTIFICATE ───────────────────────────────────────────────────────────────
//

/// An achievement certificate for a completed course.
///
/// This is the document model only. Rendering to HTML happens here; turning
/// that markup into an image or PDF is the embedder's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    student_name: String,
    course_title: String,
    course_category: String,
    course_owner: String,
    completed_on: DateTime<Utc>,
    duration_text: Option<String>,
}

impl Certificate {
    /// Creates a `Certificate`.
    ///
    /// Eligibility (100% completion) is checked by the issuing service; this
    /// constructor only validates the document fields.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError` if the student name or course title is
    /// empty after trimming.
    pub fn new(
        student_name: impl Into<String>,
        course_title: impl Into<String>,
        course_category: impl Into<String>,
        course_owner: impl Into<String>,
        completed_on: DateTime<Utc>,
        duration_text: Option<String>,
    ) -> Result<Self, CertificateError> {
        let student_name = student_name.into().trim().to_owned();
        if student_name.is_empty() {
            return Err(CertificateError::EmptyStudentName);
        }
        let course_title = course_title.into().trim().to_owned();
        if course_title.is_empty() {
            return Err(CertificateError::EmptyCourseTitle);
        }

        Ok(Self {
            student_name,
            course_title,
            course_category: course_category.into().trim().to_owned(),
            course_owner: course_owner.into().trim().to_owned(),
            completed_on,
            duration_text,
        })
    }

    // Accessors
    #[must_use]
    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    #[must_use]
    pub fn course_title(&self) -> &str {
        &self.course_title
    }

    #[must_use]
    pub fn course_category(&self) -> &str {
        &self.course_category
    }

    #[must_use]
    pub fn course_owner(&self) -> &str {
        &self.course_owner
    }

    #[must_use]
    pub fn completed_on(&self) -> DateTime<Utc> {
        self.completed_on
    }

    #[must_use]
    pub fn duration_text(&self) -> Option<&str> {
        self.duration_text.as_deref()
    }

    /// Download file name: course title with non-alphanumerics collapsed to
    /// underscores, suffixed `_Certificate.pdf`.
    #[must_use]
    pub fn file_name(&self) -> String {
        let stem: String = self
            .course_title
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{stem}_Certificate.pdf")
    }

    /// Renders the certificate as a self-contained styled HTML fragment.
    ///
    /// The layout mirrors the printed document: academy header, award line,
    /// student and course names, completion metadata, and the signature row.
    #[must_use]
    pub fn to_html(&self) -> String {
        let date = self.completed_on.format("%-d %B %Y");
        let duration_row = self
            .duration_text
            .as_deref()
            .map(|d| {
                format!(
                    "<span class=\"meta\">Duration: <strong>{}</strong></span>",
                    escape(d)
                )
            })
            .unwrap_or_default();
        let owner_row = if self.course_owner.is_empty() {
            String::new()
        } else {
            format!("<p class=\"owner\">by {}</p>", escape(&self.course_owner))
        };

        format!(
            "<div class=\"certificate\" style=\"width:1000px;height:700px;border:8px solid #6366f1;\
padding:30px;box-sizing:border-box;text-align:center;font-family:Georgia,serif;\">\
<header><h1>Certificate of Achievement</h1></header>\
<main>\
<p class=\"lede\">This is to certify that</p>\
<h2 class=\"student\">{student}</h2>\
<p class=\"lede\">has successfully completed the course</p>\
<h3 class=\"course\">{course}</h3>\
<p class=\"category\">{category}</p>\
{owner_row}\
<div class=\"meta-row\">\
<span class=\"meta\">Completed: <strong>{date}</strong></span>\
{duration_row}\
</div>\
</main>\
<footer><span class=\"signature\">Director</span><span class=\"seal\">Verified</span></footer>\
</div>",
            student = escape(&self.student_name),
            course = escape(&self.course_title),
            category = escape(&self.course_category),
        )
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn cert() -> Certificate {
        Certificate::new(
            "Asha Nair",
            "Rust from Zero",
            "Programming",
            "VoltEdge Academy",
            fixed_now(),
            Some("30 min".to_owned()),
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_student_name() {
        let err = Certificate::new("  ", "Course", "Cat", "Owner", fixed_now(), None).unwrap_err();
        assert_eq!(err, CertificateError::EmptyStudentName);
    }

    #[test]
    fn rejects_empty_course_title() {
        let err = Certificate::new("Asha", " ", "Cat", "Owner", fixed_now(), None).unwrap_err();
        assert_eq!(err, CertificateError::EmptyCourseTitle);
    }

    #[test]
    fn file_name_sanitizes_title() {
        let cert = Certificate::new(
            "Asha Nair",
            "C++ & Rust: 2 in 1!",
            "Programming",
            "Owner",
            fixed_now(),
            None,
        )
        .unwrap();
        assert_eq!(cert.file_name(), "C_____Rust__2_in_1__Certificate.pdf");
    }

    #[test]
    fn html_contains_student_and_course() {
        let html = cert().to_html();
        assert!(html.contains("Certificate of Achievement"));
        assert!(html.contains("Asha Nair"));
        assert!(html.contains("Rust from Zero"));
        assert!(html.contains("30 min"));
    }

    #[test]
    fn html_escapes_markup_in_names() {
        let cert = Certificate::new(
            "A <script> B",
            "Tags & Things",
            "Cat",
            "Owner",
            fixed_now(),
            None,
        )
        .unwrap();
        let html = cert.to_html();
        assert!(html.contains("A &lt;script&gt; B"));
        assert!(html.contains("Tags &amp; Things"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn html_omits_missing_duration() {
        let cert =
            Certificate::new("Asha", "Course", "Cat", "Owner", fixed_now(), None).unwrap();
        assert!(!cert.to_html().contains("Duration:"));
    }
}
