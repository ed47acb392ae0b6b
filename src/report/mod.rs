//! Issue classification and remediation advice for finished results

mod recommendations;

pub use recommendations::*;

use crate::models::{UrlSampleStatus, ValidationResult};
use crate::sitemap::{MAX_ENTRIES, SOFT_MAX_FILESIZE};
use serde::Serialize;
use std::fmt;

/// Problem URLs listed individually before summarising the rest
pub const LISTED_PROBLEM_URLS: usize = 3;

/// What an issue is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    HttpStatus,
    InvalidXml,
    InvalidRoot,
    InvalidMimeType,
    InvalidLastmod,
    NotUtf8,
    TooManyEntries,
    DuplicateEntries,
    OversizedFile,
    MissingRobotsReference,
    InvalidChangefreq,
    InvalidPriority,
    SampleUnreachable,
    SampleBlocked,
    SampleNoindex,
    MissingLastmod,
    MissingChangefreq,
    MissingPriority,
    NotCompressed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Why a sampled URL is a problem, most severe reason only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum SampleProblem {
    Unreachable { error: String },
    HttpStatus { status: u16 },
    BlockedByRobots,
    Noindex,
}

impl SampleProblem {
    /// Non-200 (or failed probe) beats a robots block, which beats noindex
    pub fn of(status: &UrlSampleStatus) -> Option<Self> {
        match status.http_status {
            None => Some(SampleProblem::Unreachable {
                error: status
                    .probe_error
                    .clone()
                    .unwrap_or_else(|| "not probed".to_string()),
            }),
            Some(code) if code != 200 => Some(SampleProblem::HttpStatus { status: code }),
            Some(_) if status.blocked_by_robots => Some(SampleProblem::BlockedByRobots),
            Some(_) if status.has_noindex() => Some(SampleProblem::Noindex),
            Some(_) => None,
        }
    }

    fn kind(&self) -> IssueKind {
        match self {
            SampleProblem::Unreachable { .. } | SampleProblem::HttpStatus { .. } => {
                IssueKind::SampleUnreachable
            }
            SampleProblem::BlockedByRobots => IssueKind::SampleBlocked,
            SampleProblem::Noindex => IssueKind::SampleNoindex,
        }
    }
}

impl fmt::Display for SampleProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleProblem::Unreachable { error } => write!(f, "unreachable ({})", error),
            SampleProblem::HttpStatus { status } => write!(f, "HTTP status {}", status),
            SampleProblem::BlockedByRobots => write!(f, "blocked by robots.txt"),
            SampleProblem::Noindex => write!(f, "has a noindex directive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblemUrl {
    pub url: String,
    #[serde(flatten)]
    pub problem: SampleProblem,
}

/// Classified findings for one result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueReport {
    pub critical: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub info: Vec<Issue>,
    /// The first few problematic sampled URLs
    pub problem_urls: Vec<ProblemUrl>,
    /// How many more problematic sampled URLs were not listed
    pub more_problem_urls: usize,
}

impl IssueReport {
    pub fn is_clean(&self) -> bool {
        self.critical.is_empty() && self.warnings.is_empty()
    }

    pub fn has(&self, kind: IssueKind) -> bool {
        self.critical
            .iter()
            .chain(&self.warnings)
            .chain(&self.info)
            .any(|issue| issue.kind == kind)
    }
}

/// Sort a finished result's findings by severity
///
/// Classification stops at the first stage that halted the run: a failed
/// fetch yields only the status issue, an unparsable document only issues
/// known before parsing.
pub fn classify(result: &ValidationResult) -> IssueReport {
    let mut report = IssueReport::default();

    if !result.fetched_ok() {
        let status = result
            .http_status
            .map(|code| code.to_string())
            .unwrap_or_else(|| "unreachable".to_string());
        report.critical.push(Issue::new(
            IssueKind::HttpStatus,
            format!("HTTP status is not 200 OK but {}", status),
        ));
    }
    if !result.fetch_succeeded() {
        return report;
    }

    if !result.valid_mime_type {
        report.critical.push(Issue::new(
            IssueKind::InvalidMimeType,
            format!(
                "Sitemap is served with a wrong MIME type: {}",
                result.content_type.as_deref().unwrap_or("unknown")
            ),
        ));
    }

    if !result.valid_xml {
        report.critical.push(Issue::new(
            IssueKind::InvalidXml,
            "Sitemap is not well-formed XML",
        ));
        return report;
    }

    if !result.valid_root_element {
        report.critical.push(Issue::new(
            IssueKind::InvalidRoot,
            "Invalid root element or namespace",
        ));
    }
    if result.has_invalid_lastmod == Some(true) {
        report.critical.push(Issue::new(
            IssueKind::InvalidLastmod,
            "Sitemap contains invalid lastmod date formats",
        ));
    }

    classify_warnings(result, &mut report);
    classify_info(result, &mut report);
    classify_samples(result, &mut report);

    report
}

fn classify_warnings(result: &ValidationResult, report: &mut IssueReport) {
    let warnings = &mut report.warnings;

    if !result.encoding_utf8 {
        warnings.push(Issue::new(IssueKind::NotUtf8, "Sitemap is not UTF-8 encoded"));
    }
    if result.url_count > MAX_ENTRIES {
        warnings.push(Issue::new(
            IssueKind::TooManyEntries,
            format!(
                "Sitemap contains more than {} URLs ({})",
                MAX_ENTRIES, result.url_count
            ),
        ));
    }
    if result.duplicate_count() > 0 {
        warnings.push(Issue::new(
            IssueKind::DuplicateEntries,
            format!("Sitemap contains {} duplicate URLs", result.duplicate_count()),
        ));
    }
    if result.filesize > SOFT_MAX_FILESIZE {
        warnings.push(Issue::new(
            IssueKind::OversizedFile,
            format!(
                "Sitemap size ({:.2} MB) exceeds the recommended maximum of 50 MB",
                result.filesize as f64 / (1024.0 * 1024.0)
            ),
        ));
    }
    if result.robots_txt_accessible && !result.robots_txt_reference {
        warnings.push(Issue::new(
            IssueKind::MissingRobotsReference,
            "Sitemap is not referenced in robots.txt",
        ));
    }
    if result.has_invalid_changefreq == Some(true) {
        warnings.push(Issue::new(
            IssueKind::InvalidChangefreq,
            "Sitemap contains invalid changefreq values",
        ));
    }
    if result.has_invalid_priority == Some(true) {
        warnings.push(Issue::new(
            IssueKind::InvalidPriority,
            "Sitemap contains invalid priority values (outside 0.0 - 1.0)",
        ));
    }
}

fn classify_info(result: &ValidationResult, report: &mut IssueReport) {
    let info = &mut report.info;

    if !result.has_lastmod {
        info.push(Issue::new(
            IssueKind::MissingLastmod,
            "Sitemap contains no lastmod elements",
        ));
    }
    if result.has_priority == Some(false) {
        info.push(Issue::new(
            IssueKind::MissingPriority,
            "Sitemap contains no priority elements",
        ));
    }
    if result.has_changefreq == Some(false) {
        info.push(Issue::new(
            IssueKind::MissingChangefreq,
            "Sitemap contains no changefreq elements",
        ));
    }
    if !result.is_compressed {
        let message = if result.http_compressed {
            "Sitemap is not stored as .xml.gz but is compressed in transit"
        } else {
            "Sitemap is not compressed (neither .xml.gz nor HTTP compression)"
        };
        info.push(Issue::new(IssueKind::NotCompressed, message));
    }
}

fn classify_samples(result: &ValidationResult, report: &mut IssueReport) {
    let problems: Vec<ProblemUrl> = result
        .url_sample_status
        .iter()
        .filter_map(|status| {
            SampleProblem::of(status).map(|problem| ProblemUrl {
                url: status.url.clone(),
                problem,
            })
        })
        .collect();

    for problem in &problems {
        report.warnings.push(Issue::new(
            problem.problem.kind(),
            format!("Sampled URL {}: {}", problem.url, problem.problem),
        ));
    }

    report.more_problem_urls = problems.len().saturating_sub(LISTED_PROBLEM_URLS);
    report.problem_urls = problems.into_iter().take(LISTED_PROBLEM_URLS).collect();
}
