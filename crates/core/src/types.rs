//! Domain types for report payloads and generated documents.

use crate::normalize::normalize_date;
use crate::placeholder::PlaceholderMap;
use serde::{de, Deserialize, Deserializer, Serialize};

/// Placeholder keys supplied by [`ReportPayload`], in template order.
pub const PAYLOAD_KEYS: &[&str] = &[
    "SERVICE_CODE",
    "ID_NUMBER",
    "NAME_AR",
    "NAME_EN",
    "DAYS_COUNT",
    "ENTRY_DATE_GREGORIAN",
    "EXIT_DATE_GREGORIAN",
    "ENTRY_DATE_HIJRI",
    "EXIT_DATE_HIJRI",
    "REPORT_ISSUE_DATE",
    "NATIONALITY_AR",
    "NATIONALITY_EN",
    "DOCTOR_NAME_AR",
    "DOCTOR_NAME_EN",
    "JOB_TITLE_AR",
    "JOB_TITLE_EN",
    "HOSPITAL_NAME_AR",
    "HOSPITAL_NAME_EN",
    "PRINT_DATE",
    "PRINT_TIME",
];

/// Base name of downloaded reports.
const DOWNLOAD_STEM: &str = "sickLeaves";

/// Report fields submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ReportPayload {
    pub service_code: String,
    pub id_number: String,
    pub name_ar: String,
    pub name_en: String,
    #[serde(deserialize_with = "integer_or_numeric_string")]
    pub days_count: i64,
    pub entry_date_gregorian: String,
    pub exit_date_gregorian: String,
    #[serde(default)]
    pub entry_date_hijri: Option<String>,
    #[serde(default)]
    pub exit_date_hijri: Option<String>,
    pub report_issue_date: String,
    pub nationality_ar: String,
    pub nationality_en: String,
    pub doctor_name_ar: String,
    pub doctor_name_en: String,
    pub job_title_ar: String,
    pub job_title_en: String,
    pub hospital_name_ar: String,
    pub hospital_name_en: String,
    pub print_date: String,
    pub print_time: String,
}

/// Accept `3` as well as `"3"`, as form-built clients send numbers as text.
fn integer_or_numeric_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(i64),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected an integer, got {:?}", text))),
    }
}

impl ReportPayload {
    /// Render every field into the text that replaces its `{{KEY}}` placeholder.
    ///
    /// Date fields are normalized to `DD-MM-YYYY`; missing optional values
    /// render as empty strings.
    pub fn placeholders(&self) -> PlaceholderMap {
        let optional_date =
            |value: &Option<String>| value.as_deref().map(normalize_date).unwrap_or_default();

        let mut map = PlaceholderMap::new();
        map.insert("SERVICE_CODE", &self.service_code);
        map.insert("ID_NUMBER", &self.id_number);
        map.insert("NAME_AR", &self.name_ar);
        map.insert("NAME_EN", &self.name_en);
        map.insert("DAYS_COUNT", self.days_count.to_string());
        map.insert("ENTRY_DATE_GREGORIAN", normalize_date(&self.entry_date_gregorian));
        map.insert("EXIT_DATE_GREGORIAN", normalize_date(&self.exit_date_gregorian));
        map.insert("ENTRY_DATE_HIJRI", optional_date(&self.entry_date_hijri));
        map.insert("EXIT_DATE_HIJRI", optional_date(&self.exit_date_hijri));
        map.insert("REPORT_ISSUE_DATE", normalize_date(&self.report_issue_date));
        map.insert("NATIONALITY_AR", &self.nationality_ar);
        map.insert("NATIONALITY_EN", &self.nationality_en);
        map.insert("DOCTOR_NAME_AR", &self.doctor_name_ar);
        map.insert("DOCTOR_NAME_EN", &self.doctor_name_en);
        map.insert("JOB_TITLE_AR", &self.job_title_ar);
        map.insert("JOB_TITLE_EN", &self.job_title_en);
        map.insert("HOSPITAL_NAME_AR", &self.hospital_name_ar);
        map.insert("HOSPITAL_NAME_EN", &self.hospital_name_en);
        map.insert("PRINT_DATE", normalize_date(&self.print_date));
        map.insert("PRINT_TIME", &self.print_time);
        map
    }

    /// Download filename for this report, e.g. `sickLeaves_<name>_<id>.pdf`.
    ///
    /// May contain non-ASCII characters; pair it with
    /// [`DocumentFormat::fallback_filename`] in headers.
    pub fn download_filename(&self, format: DocumentFormat) -> String {
        format!(
            "{}_{}_{}.{}",
            DOWNLOAD_STEM,
            self.name_ar,
            self.id_number,
            format.extension()
        )
    }
}

/// The format of a generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// PowerPoint (Office Open XML).
    Pptx,
    /// PDF converted from the PPTX.
    Pdf,
}

impl DocumentFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        if bytes.starts_with(b"%PDF") {
            return Some(Self::Pdf);
        }

        None
    }

    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pptx => "pptx",
            Self::Pdf => "pdf",
        }
    }

    /// MIME type sent in `Content-Type`.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::Pdf => "application/pdf",
        }
    }

    /// ASCII-only filename for clients that ignore `filename*`.
    pub fn fallback_filename(self) -> String {
        format!("{}.{}", DOWNLOAD_STEM, self.extension())
    }
}

/// Text read back from a single slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedSlide {
    /// 1-based slide number.
    pub number: usize,

    /// Part name inside the package, e.g. `ppt/slides/slide1.xml`.
    pub part: String,

    /// One entry per text paragraph, in document order.
    pub lines: Vec<String>,
}

impl ExtractedSlide {
    /// Create a new slide with the given number and part name.
    pub fn new(number: usize, part: impl Into<String>) -> Self {
        Self {
            number,
            part: part.into(),
            lines: Vec::new(),
        }
    }

    /// Add a text line to this slide.
    pub fn add_line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    /// Get non-empty text lines.
    pub fn non_empty_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .map(|l| l.as_str())
            .filter(|s| !s.trim().is_empty())
            .collect()
    }

    /// All lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}
