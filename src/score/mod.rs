//! Weighted 0-100 sitemap score and letter grade

use crate::models::{Grade, GradeColor, ValidationResult};
use crate::sitemap::{MAX_ENTRIES, SOFT_MAX_FILESIZE};
use serde::Serialize;

/// Points earned for one criterion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionScore {
    pub name: &'static str,
    pub earned: f64,
    pub max: f64,
}

/// Points deducted for invalid values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Penalty {
    pub name: &'static str,
    pub points: f64,
}

/// Full scoring outcome for one result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub criteria: Vec<CriterionScore>,
    pub penalties: Vec<Penalty>,
    /// Points earned minus penalties
    pub earned: f64,
    /// Sum of the maxima of every applicable criterion
    pub achievable: f64,
    /// Clamped percentage, rounded to one decimal
    pub score: f64,
    pub grade: Grade,
}

#[derive(Default)]
struct Tally {
    criteria: Vec<CriterionScore>,
    penalties: Vec<Penalty>,
}

impl Tally {
    fn award(&mut self, name: &'static str, max: f64, earned: f64) {
        self.criteria.push(CriterionScore { name, earned, max });
    }

    fn check(&mut self, name: &'static str, max: f64, passed: bool) {
        self.award(name, max, if passed { max } else { 0.0 });
    }

    /// Criterion that only applies when the fact was computed
    fn check_optional(&mut self, name: &'static str, max: f64, passed: Option<bool>) {
        if let Some(passed) = passed {
            self.check(name, max, passed);
        }
    }

    fn penalize(&mut self, name: &'static str, points: f64, applies: Option<bool>) {
        if applies == Some(true) {
            self.penalties.push(Penalty { name, points });
        }
    }
}

/// Score a finished result
///
/// Pure: the same facts always give the same score. Facts that were never
/// computed (`None`) drop out of the achievable total instead of counting as
/// failures.
pub fn score(result: &ValidationResult) -> ScoreBreakdown {
    let mut tally = Tally::default();

    tally.check("HTTP 200", 12.0, result.fetched_ok());
    tally.check("Well-formed XML", 18.0, result.valid_xml);
    tally.check("UTF-8 encoding", 6.0, result.encoding_utf8);
    tally.check("Valid root element", 12.0, result.valid_root_element);
    tally.check("Valid MIME type", 8.0, result.valid_mime_type);
    tally.check("File size within 50 MB", 5.0, result.filesize <= SOFT_MAX_FILESIZE);
    tally.check("At most 50,000 entries", 5.0, result.url_count <= MAX_ENTRIES);
    tally.check("No duplicate entries", 5.0, result.unique_url_count == result.url_count);
    tally.check("Load time under 1s", 5.0, result.load_time < 1.0);

    let compression = if result.is_compressed {
        4.0
    } else if result.http_compressed {
        2.0
    } else {
        0.0
    };
    tally.award("Compression", 4.0, compression);

    tally.check("Referenced in robots.txt", 7.0, result.robots_txt_reference);

    tally.check("Has lastmod", 5.0, result.has_lastmod);
    tally.penalize("Invalid lastmod", 10.0, result.has_invalid_lastmod);

    tally.check_optional("Has priority", 3.0, result.has_priority);
    tally.penalize("Invalid priority", 3.0, result.has_invalid_priority);

    tally.check_optional("Has changefreq", 2.0, result.has_changefreq);
    tally.penalize("Invalid changefreq", 2.0, result.has_invalid_changefreq);

    tally.check_optional(
        "Rich extensions",
        5.0,
        result.extensions.as_ref().map(|ext| ext.any_present()),
    );

    if !result.url_sample_status.is_empty() {
        tally.award("Sampled URLs indexable", 10.0, sample_tier(result));
    }

    let achievable: f64 = tally.criteria.iter().map(|c| c.max).sum();
    let earned: f64 = tally.criteria.iter().map(|c| c.earned).sum::<f64>()
        - tally.penalties.iter().map(|p| p.points).sum::<f64>();

    let percent = if achievable > 0.0 {
        (earned / achievable * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    ScoreBreakdown {
        criteria: tally.criteria,
        penalties: tally.penalties,
        earned,
        achievable,
        score: (percent * 10.0).round() / 10.0,
        grade: grade_for(percent),
    }
}

/// Points for the share of indexable samples
fn sample_tier(result: &ValidationResult) -> f64 {
    let total = result.url_sample_status.len();
    let indexable = result
        .url_sample_status
        .iter()
        .filter(|s| s.is_indexable())
        .count();
    let percent = indexable as f64 / total as f64 * 100.0;

    if percent >= 90.0 {
        10.0
    } else if percent >= 75.0 {
        7.0
    } else if percent >= 50.0 {
        5.0
    } else if percent > 0.0 {
        2.0
    } else {
        0.0
    }
}

/// Store score and grade on the result
pub fn apply(result: &mut ValidationResult) -> ScoreBreakdown {
    let breakdown = score(result);
    result.sitemap_score = Some(breakdown.score);
    result.sitemap_grade = Some(breakdown.grade.clone());
    breakdown
}

/// Grade for an unrounded percentage
pub fn grade_for(score: f64) -> Grade {
    const GRADES: &[(f64, &str, GradeColor, &str)] = &[
        (95.0, "A+", GradeColor::Success, "Excellent"),
        (90.0, "A", GradeColor::Success, "Very good"),
        (85.0, "A-", GradeColor::Success, "Good"),
        (80.0, "B+", GradeColor::Success, "Good"),
        (75.0, "B", GradeColor::Primary, "Good"),
        (70.0, "B-", GradeColor::Primary, "Satisfactory"),
        (65.0, "C+", GradeColor::Primary, "Satisfactory"),
        (60.0, "C", GradeColor::Warning, "Sufficient"),
        (55.0, "C-", GradeColor::Warning, "Sufficient"),
        (50.0, "D+", GradeColor::Warning, "Poor"),
        (45.0, "D", GradeColor::Danger, "Poor"),
    ];

    let (grade, color, text) = GRADES
        .iter()
        .find(|(min, ..)| score >= *min)
        .map(|(_, grade, color, text)| (*grade, *color, *text))
        .unwrap_or(("F", GradeColor::Danger, "Insufficient"));

    Grade {
        grade: grade.to_string(),
        color,
        text: text.to_string(),
    }
}
