//! Remediation advice keyed off the same facts as the issue list

use crate::models::ValidationResult;
use crate::sitemap::{MAX_ENTRIES, SOFT_MAX_FILESIZE};
use serde::Serialize;
use url::Url;

/// One piece of advice with a copy-pasteable example
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub title: &'static str,
    pub description: &'static str,
    pub example: &'static str,
}

const VALID_XML: Recommendation = Recommendation {
    title: "Use a valid XML structure",
    description: "Make sure the sitemap is well-formed XML and uses the correct root element \
        (`urlset` or `sitemapindex`) with the sitemap namespace.",
    example: r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://www.example.com/</loc>
    <lastmod>2025-04-01</lastmod>
  </url>
</urlset>"#,
};

const MIME_TYPE: Recommendation = Recommendation {
    title: "Configure the correct MIME type",
    description: "Serve the sitemap with a proper Content-Type: application/xml or text/xml \
        for XML files, application/gzip for compressed files.",
    example: r#"# Apache (.htaccess):
AddType application/xml .xml
AddType application/gzip .gz

# Nginx (nginx.conf):
types {
    application/xml xml;
    application/gzip gz;
}"#,
};

const SPLIT_SITEMAP: Recommendation = Recommendation {
    title: "Split the sitemap",
    description: "The sitemap exceeds the limit of 50,000 URLs. Split it into several \
        sitemap files and list them in a sitemap index.",
    example: r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap>
    <loc>https://www.example.com/sitemap1.xml</loc>
    <lastmod>2025-04-01</lastmod>
  </sitemap>
  <sitemap>
    <loc>https://www.example.com/sitemap2.xml</loc>
    <lastmod>2025-04-01</lastmod>
  </sitemap>
</sitemapindex>"#,
};

const STORE_GZIPPED: Recommendation = Recommendation {
    title: "Store the sitemap as .xml.gz",
    description: "The sitemap is compressed in transit, but storing it as a .xml.gz file \
        keeps it compatible with every search engine.",
    example: r#"# On the command line:
gzip -9 sitemap.xml"#,
};

const COMPRESS: Recommendation = Recommendation {
    title: "Compress the sitemap",
    description: "The sitemap is larger than recommended. Store it gzip-compressed (.xml.gz) \
        or enable HTTP compression on the server.",
    example: r#"# On the command line:
gzip -9 sitemap.xml

# Or HTTP compression in Apache (.htaccess):
<IfModule mod_deflate.c>
  AddOutputFilterByType DEFLATE text/xml application/xml
</IfModule>"#,
};

const LASTMOD_FORMAT: Recommendation = Recommendation {
    title: "Use valid lastmod date formats",
    description: "Fix the invalid lastmod values. Use ISO 8601 (YYYY-MM-DD), optionally \
        with a time and a timezone offset.",
    example: r#"<url>
  <loc>https://www.example.com/page</loc>
  <lastmod>2025-04-01</lastmod>
</url>

<!-- With a time -->
<url>
  <loc>https://www.example.com/page</loc>
  <lastmod>2025-04-01T12:30:00+00:00</lastmod>
</url>"#,
};

const CHANGEFREQ_VALUES: Recommendation = Recommendation {
    title: "Use valid changefreq values",
    description: "Only use the changefreq values always, hourly, daily, weekly, monthly, \
        yearly and never.",
    example: r#"<url>
  <loc>https://www.example.com/home</loc>
  <changefreq>daily</changefreq>
</url>

<url>
  <loc>https://www.example.com/about</loc>
  <changefreq>monthly</changefreq>
</url>"#,
};

const PRIORITY_RANGE: Recommendation = Recommendation {
    title: "Use valid priority values",
    description: "Priority values must lie between 0.0 and 1.0. The default is 0.5.",
    example: r#"<url>
  <loc>https://www.example.com/</loc>
  <priority>1.0</priority>
</url>

<url>
  <loc>https://www.example.com/category</loc>
  <priority>0.8</priority>
</url>"#,
};

const ADD_LASTMOD: Recommendation = Recommendation {
    title: "Add lastmod dates",
    description: "lastmod tells search engines when content changed. Add a lastmod element \
        to every URL.",
    example: r#"<url>
  <loc>https://www.example.com/page</loc>
  <lastmod>2025-04-01</lastmod>
</url>"#,
};

const ROBOTS_REFERENCE: Recommendation = Recommendation {
    title: "Reference the sitemap in robots.txt",
    description: "List the sitemap in robots.txt so that search engines find it on their own.",
    example: r#"# robots.txt
User-agent: *
Allow: /

Sitemap: https://www.example.com/sitemap.xml"#,
};

const MEDIA_EXTENSIONS: Recommendation = Recommendation {
    title: "Consider image and video extensions",
    description: "If the site has images or videos, the sitemap extensions for them help \
        search engines index that media.",
    example: r#"<url>
  <loc>https://www.example.com/page-with-images</loc>
  <image:image>
    <image:loc>https://www.example.com/images/example.jpg</image:loc>
  </image:image>
</url>

<url>
  <loc>https://www.example.com/page-with-video</loc>
  <video:video>
    <video:thumbnail_loc>https://www.example.com/thumbs/video.jpg</video:thumbnail_loc>
    <video:title>Video title</video:title>
    <video:description>Video description</video:description>
    <video:content_loc>https://www.example.com/videos/video.mp4</video:content_loc>
  </video:video>
</url>"#,
};

const HREFLANG: Recommendation = Recommendation {
    title: "International sites: add hreflang alternates",
    description: "If the site exists in several languages, hreflang alternates point search \
        engines at the right version for each language and region.",
    example: r#"<url>
  <loc>https://www.example.com/english-page</loc>
  <xhtml:link rel="alternate" hreflang="en" href="https://www.example.com/english-page" />
  <xhtml:link rel="alternate" hreflang="de" href="https://www.example.com/de/deutsche-seite" />
</url>"#,
};

/// Independent recommendations for a finished result
pub fn recommend(result: &ValidationResult) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    if !result.fetch_succeeded() {
        return recommendations;
    }

    if !result.valid_xml || !result.valid_root_element {
        recommendations.push(VALID_XML);
    }
    if !result.valid_mime_type {
        recommendations.push(MIME_TYPE);
    }
    if !result.valid_xml {
        return recommendations;
    }

    if result.url_count > MAX_ENTRIES {
        recommendations.push(SPLIT_SITEMAP);
    }
    if result.filesize > SOFT_MAX_FILESIZE && !result.is_compressed {
        recommendations.push(if result.http_compressed {
            STORE_GZIPPED
        } else {
            COMPRESS
        });
    }

    if result.has_invalid_lastmod == Some(true) {
        recommendations.push(LASTMOD_FORMAT);
    }
    if result.has_invalid_changefreq == Some(true) {
        recommendations.push(CHANGEFREQ_VALUES);
    }
    if result.has_invalid_priority == Some(true) {
        recommendations.push(PRIORITY_RANGE);
    }
    if !result.has_lastmod {
        recommendations.push(ADD_LASTMOD);
    }
    if !result.robots_txt_reference {
        recommendations.push(ROBOTS_REFERENCE);
    }

    if let Some(ext) = &result.extensions {
        if !ext.has_image_extension && !ext.has_video_extension {
            recommendations.push(MEDIA_EXTENSIONS);
        }
        if !ext.has_alternate_links && is_com_host(&result.url) {
            recommendations.push(HREFLANG);
        }
    }

    recommendations
}

fn is_com_host(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase().ends_with(".com")))
        .unwrap_or(false)
}
