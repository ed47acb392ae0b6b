//! Check command implementation

use crate::config::Config;
use crate::error::Result;
use crate::models::ValidationResult;
use crate::progress::add_spinner;
use crate::report::{classify, recommend, IssueReport, Recommendation};
use crate::score::{self, ScoreBreakdown};
use crate::validator::SitemapValidator;
use serde::Serialize;
use tracing::info;

/// Per-run overrides from the command line
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Number of sampled URLs to probe
    pub samples: Option<usize>,
    /// Per-request timeout in seconds
    pub timeout: Option<u64>,
    /// Skip TLS certificate verification
    pub insecure: bool,
    /// Show a spinner while the check runs
    pub show_progress: bool,
}

/// Everything the check command reports
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub result: ValidationResult,
    /// `None` when the run halted before scoring
    pub breakdown: Option<ScoreBreakdown>,
    pub issues: IssueReport,
    pub recommendations: Vec<Recommendation>,
}

/// Validate one sitemap and collect the report
pub async fn cmd_check(config: &Config, url: &str, options: CheckOptions) -> Result<CheckReport> {
    let mut config = config.clone();
    if let Some(samples) = options.samples {
        config.validator.sample_urls_count = samples;
    }
    if let Some(timeout) = options.timeout {
        config.validator.http_timeout = timeout;
    }
    if options.insecure {
        config.security.verify_ssl = false;
    }

    let validator = SitemapValidator::new(config)?;

    let spinner = options
        .show_progress
        .then(|| add_spinner(format!("Checking {}", url)));
    let outcome = validator.validate(url).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let result = outcome?;

    let breakdown = result.sitemap_score.map(|_| score::score(&result));
    let issues = classify(&result);
    let recommendations = recommend(&result);

    info!(
        "Check complete: {} critical, {} warnings, {} recommendations",
        issues.critical.len(),
        issues.warnings.len(),
        recommendations.len()
    );

    Ok(CheckReport {
        result,
        breakdown,
        issues,
        recommendations,
    })
}

/// Print a check report to the console
pub fn print_check_report(report: &CheckReport) {
    let result = &report.result;

    println!("\n🗺️  Sitemap Check: {}\n", result.url);

    match (&result.sitemap_score, &result.sitemap_grade) {
        (Some(score), Some(grade)) => {
            println!("Score: {:.1} / 100  {} ({})", score, grade.grade, grade.text);
        }
        _ => println!("Score: not available (the sitemap could not be analyzed)"),
    }
    println!("Checked: {}", result.date_checked.format("%Y-%m-%d %H:%M:%S UTC"));

    println!("\nTransport:");
    match result.http_status {
        Some(status) => println!("  HTTP status: {}", status),
        None => println!("  HTTP status: ✗ unreachable"),
    }
    println!(
        "  Content-Type: {} {}",
        result.content_type.as_deref().unwrap_or("none"),
        mark(result.valid_mime_type)
    );
    println!("  Load time: {:.2}s", result.load_time);
    println!("  Size: {} bytes", result.filesize);
    let compression = if result.is_compressed {
        "✓ gzip file"
    } else if result.http_compressed {
        "✓ HTTP compression"
    } else {
        "⚠ none"
    };
    println!("  Compression: {}", compression);

    println!("\nStructure:");
    println!("  Well-formed XML: {}", mark(result.valid_xml));
    println!("  UTF-8: {}", mark(result.encoding_utf8));
    println!("  Root element: {}", mark(result.valid_root_element));
    if result.is_sitemap_index {
        println!("  Type: sitemap index");
    }
    println!(
        "  Entries: {} ({} unique)",
        result.url_count, result.unique_url_count
    );
    println!("  lastmod: {}", presence(Some(result.has_lastmod), result.has_invalid_lastmod));
    if !result.is_sitemap_index {
        println!(
            "  changefreq: {}",
            presence(result.has_changefreq, result.has_invalid_changefreq)
        );
        println!(
            "  priority: {}",
            presence(result.has_priority, result.has_invalid_priority)
        );
    }
    if let Some(ext) = &result.extensions {
        let mut found = Vec::new();
        if ext.has_image_extension {
            found.push(format!("image ({})", ext.image_extension_count));
        }
        if ext.has_video_extension {
            found.push(format!("video ({})", ext.video_extension_count));
        }
        if ext.has_news_extension {
            found.push(format!("news ({})", ext.news_extension_count));
        }
        if ext.has_mobile_extension {
            found.push(format!("mobile ({})", ext.mobile_extension_count));
        }
        if ext.has_alternate_links {
            found.push(format!("hreflang ({})", ext.alternate_links_count));
        }
        if found.is_empty() {
            println!("  Extensions: none");
        } else {
            println!("  Extensions: {}", found.join(", "));
        }
    }

    println!("\nrobots.txt:");
    println!("  Reachable: {}", mark(result.robots_txt_accessible));
    println!("  References sitemap: {}", mark(result.robots_txt_reference));

    if !result.url_sample_status.is_empty() {
        println!("\nSampled URLs:");
        for sample in &result.url_sample_status {
            let status = match (sample.http_status, &sample.probe_error) {
                (Some(code), _) => code.to_string(),
                (None, Some(error)) => error.clone(),
                (None, None) => "-".to_string(),
            };
            let mut notes = Vec::new();
            if sample.blocked_by_robots {
                notes.push("blocked");
            }
            if sample.has_noindex() {
                notes.push("noindex");
            }
            let notes = if notes.is_empty() {
                String::new()
            } else {
                format!(" [{}]", notes.join(", "))
            };
            println!(
                "  {} {} {}{}",
                mark(sample.is_indexable()),
                status,
                sample.url,
                notes
            );
        }
    }

    if let Some(breakdown) = &report.breakdown {
        println!(
            "\nPoints: {:.0} of {:.0} achievable",
            breakdown.earned, breakdown.achievable
        );
        for penalty in &breakdown.penalties {
            println!("  -{:.0} {}", penalty.points, penalty.name);
        }
    }

    let issues = &report.issues;
    if issues.is_clean() && issues.info.is_empty() {
        println!("\n✓ No issues found");
    } else {
        print_issue_list("✗ Critical", &issues.critical);
        print_issue_list("⚠ Warnings", &issues.warnings);
        print_issue_list("ℹ Info", &issues.info);
    }
    if !issues.problem_urls.is_empty() {
        println!("\nProblem URLs:");
        for problem in &issues.problem_urls {
            println!("  • {} ({})", problem.url, problem.problem);
        }
        if issues.more_problem_urls > 0 {
            println!("  ... and {} more", issues.more_problem_urls);
        }
    }

    if !report.recommendations.is_empty() {
        println!("\n💡 Recommendations\n");
        for (i, rec) in report.recommendations.iter().enumerate() {
            println!("{}. {}", i + 1, rec.title);
            println!("   {}", rec.description);
            for line in rec.example.lines() {
                println!("     {}", line);
            }
            println!();
        }
    }
}

fn print_issue_list(heading: &str, issues: &[crate::report::Issue]) {
    if issues.is_empty() {
        return;
    }
    println!("\n{} ({}):", heading, issues.len());
    for issue in issues {
        println!("  • {}", issue.message);
    }
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}

fn presence(present: Option<bool>, invalid: Option<bool>) -> &'static str {
    match (present, invalid) {
        (Some(true), Some(true)) => "⚠ present, some values invalid",
        (Some(true), _) => "✓ present",
        (Some(false), _) => "✗ missing",
        (None, _) => "-",
    }
}
