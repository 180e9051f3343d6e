//! CSV and bulk-paste parsing for competitor imports, plus the full-column
//! CSV export. The dialect is deliberately small: quoted fields, doubled-quote
//! escapes, one record per line. That is all the dashboard has ever emitted.

use crate::competitors::{Competitor, CompetitorDraft, CompetitorStatus};

/// Column order of the export, and the headers the importer recognizes.
const EXPORT_HEADER: [&str; 12] = [
    "id",
    "name",
    "website_url",
    "twitter_url",
    "instagram_url",
    "facebook_url",
    "reddit_url",
    "discord_url",
    "industry",
    "description",
    "logo_url",
    "status",
];

/// Parse a header-driven competitor CSV into drafts.
///
/// Header matching is case- and whitespace-insensitive; `website` is accepted
/// as an alias for `website_url`. Rows with a blank name are skipped.
#[must_use]
pub fn parse_competitors_csv(text: &str) -> Vec<CompetitorDraft> {
    let rows = split_csv_rows(text);
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };

    let normalized: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();
    let index = |name: &str| normalized.iter().position(|h| h == name);

    let idx_name = index("name");
    let idx_website = index("website_url").or_else(|| index("website"));
    let idx_twitter = index("twitter_url");
    let idx_instagram = index("instagram_url");
    let idx_facebook = index("facebook_url");
    let idx_reddit = index("reddit_url");
    let idx_discord = index("discord_url");
    let idx_industry = index("industry");
    let idx_description = index("description");
    let idx_logo = index("logo_url");
    let idx_status = index("status");

    let mut drafts = Vec::new();
    for row in data {
        let name = column(row, idx_name).trim();
        if name.is_empty() {
            continue;
        }
        drafts.push(CompetitorDraft {
            name: name.to_string(),
            website_url: optional(column(row, idx_website)),
            twitter_url: optional(column(row, idx_twitter)),
            instagram_url: optional(column(row, idx_instagram)),
            facebook_url: optional(column(row, idx_facebook)),
            reddit_url: optional(column(row, idx_reddit)),
            discord_url: optional(column(row, idx_discord)),
            industry: optional(column(row, idx_industry)),
            description: optional(column(row, idx_description)),
            logo_url: optional(column(row, idx_logo)),
            status: CompetitorStatus::parse_lenient(column(row, idx_status)),
        });
    }
    drafts
}

/// Parse bulk-paste input: one competitor per line as
/// `Name, Website, Industry, Description` with trailing fields optional.
#[must_use]
pub fn parse_bulk_lines(text: &str) -> Vec<CompetitorDraft> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut parts = line.split(',').map(str::trim);
            let name = parts.next().unwrap_or("").to_string();
            if name.is_empty() {
                return None;
            }
            Some(CompetitorDraft {
                name,
                website_url: optional(parts.next().unwrap_or("")),
                industry: optional(parts.next().unwrap_or("")),
                description: optional(parts.next().unwrap_or("")),
                ..CompetitorDraft::default()
            })
        })
        .collect()
}

/// Render the full-column export. Every field is quoted and embedded quotes
/// are doubled, so the output survives commas and quotes in descriptions.
#[must_use]
pub fn competitors_to_csv(competitors: &[Competitor]) -> String {
    let mut lines = Vec::with_capacity(competitors.len() + 1);
    lines.push(
        EXPORT_HEADER
            .iter()
            .map(|h| quote_field(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    for c in competitors {
        let fields = [
            c.id.to_string(),
            c.name.clone(),
            c.website_url.clone().unwrap_or_default(),
            c.twitter_url.clone().unwrap_or_default(),
            c.instagram_url.clone().unwrap_or_default(),
            c.facebook_url.clone().unwrap_or_default(),
            c.reddit_url.clone().unwrap_or_default(),
            c.discord_url.clone().unwrap_or_default(),
            c.industry.clone().unwrap_or_default(),
            c.description.clone().unwrap_or_default(),
            c.logo_url.clone().unwrap_or_default(),
            c.status.to_string(),
        ];
        lines.push(
            fields
                .iter()
                .map(|f| quote_field(f))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

fn quote_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn column(row: &[String], index: Option<usize>) -> &str {
    index
        .and_then(|i| row.get(i))
        .map_or("", String::as_str)
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split CSV text into rows of fields, stripping a leading BOM and skipping
/// blank lines.
fn split_csv_rows(text: &str) -> Vec<Vec<String>> {
    text.strip_prefix('\u{feff}')
        .unwrap_or(text)
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(split_csv_line)
        .collect()
}

/// Tokenize one CSV line. Handles quoted fields and doubled-quote escapes;
/// quotes never span lines in this dialect.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                out.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    out.push(current);
    out
}
