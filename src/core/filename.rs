//! Monument image file names.
//!
//! Canonical form is `<yard><plot>-<lot>[letters][type].jpg`, e.g. `ITC12-3F.jpg`:
//! yard `IT`, plot `ITC12`, lot 3, front view. Anything else is treated as a legacy name.

use crate::domain::reference::ImageTypePriority;
use crate::utils::error::{RecordsError, Result};
use regex::Regex;
use serde::Serialize;
use std::cmp::Reverse;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedImageName {
    pub yard_code: String,
    pub plot_id: String,
    pub lot_number: u32,
    pub image_type: Option<char>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NamingIssueKind {
    ExtraDotBeforeDash,
    MixedCaseExtension,
    MissingDashAfterPlotId,
}

impl NamingIssueKind {
    pub fn reason(&self) -> &'static str {
        match self {
            NamingIssueKind::ExtraDotBeforeDash => "Extra dot before dash",
            NamingIssueKind::MixedCaseExtension => "Mixed case extension",
            NamingIssueKind::MissingDashAfterPlotId => "Missing dash after plot ID",
        }
    }
}

/// One detected mistake and the name with only that mistake corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamingIssue {
    pub kind: NamingIssueKind,
    pub reason: String,
    pub suggested: String,
}

impl NamingIssue {
    fn new(kind: NamingIssueKind, suggested: String) -> Self {
        Self {
            kind,
            reason: kind.reason().to_string(),
            suggested,
        }
    }
}

pub struct FilenameParser {
    canonical: Regex,
    plot_hint: Regex,
    missing_dash: Regex,
    priority: ImageTypePriority,
}

impl FilenameParser {
    pub fn new(priority: ImageTypePriority) -> Result<Self> {
        let type_class: String = priority
            .letters()
            .iter()
            .map(|c| regex::escape(&c.to_string()))
            .collect();

        // The lazy letter run lets a trailing type letter win over disambiguation letters.
        let canonical = if type_class.is_empty() {
            r"^([A-Za-z]{2})([A-Za-z]?[0-9]+)-([0-9]+)[A-Za-z]*()\.(?i:jpe?g)$".to_string()
        } else {
            format!(
                r"^([A-Za-z]{{2}})([A-Za-z]?[0-9]+)-([0-9]+)[A-Za-z]*?([{}])?\.(?i:jpe?g)$",
                type_class
            )
        };

        Ok(Self {
            canonical: compile(&canonical)?,
            plot_hint: compile(r"^([A-Za-z]{2}[A-Za-z]?[0-9]+)")?,
            missing_dash: compile(r"^([A-Z]{2}[A-Z]?[0-9]+)([0-9])")?,
            priority,
        })
    }

    pub fn priority(&self) -> &ImageTypePriority {
        &self.priority
    }

    /// Parse a canonical name. `None` means legacy or malformed, never an error.
    pub fn parse(&self, filename: &str) -> Option<ParsedImageName> {
        let caps = self.canonical.captures(filename)?;

        let yard_code = caps[1].to_uppercase();
        let plot_suffix = caps[2].to_uppercase();
        let lot_number = caps[3].parse::<u32>().ok()?;
        let image_type = caps
            .get(4)
            .and_then(|m| m.as_str().chars().next());

        Some(ParsedImageName {
            plot_id: format!("{}{}", yard_code, plot_suffix),
            yard_code,
            lot_number,
            image_type,
        })
    }

    /// Best-effort plot id from the front of a name that may not be canonical,
    /// e.g. `NYG2-VP.JPG` gives `NYG2`.
    pub fn plot_hint(&self, filename: &str) -> Option<String> {
        let stem = split_extension(filename).0;
        self.plot_hint
            .captures(stem)
            .map(|caps| caps[1].to_uppercase())
    }

    /// Flag common naming mistakes. Each issue carries a suggestion with exactly that one
    /// fix applied to the original name; fixes are never combined.
    pub fn detect_naming_errors(&self, filename: &str) -> Vec<NamingIssue> {
        let mut issues = Vec::new();
        let (stem, ext) = split_extension(filename);

        if stem.contains(".-") {
            issues.push(NamingIssue::new(
                NamingIssueKind::ExtraDotBeforeDash,
                filename.replace(".-", "-"),
            ));
        }

        if let Some(ext) = ext {
            let is_jpeg = matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg");
            let has_upper = ext.chars().any(|c| c.is_ascii_uppercase());
            let has_lower = ext.chars().any(|c| c.is_ascii_lowercase());
            if is_jpeg && has_upper && has_lower {
                issues.push(NamingIssue::new(
                    NamingIssueKind::MixedCaseExtension,
                    format!("{}.{}", stem, ext.to_uppercase()),
                ));
            }
        }

        if !stem.contains('-') {
            if let Some(caps) = self.missing_dash.captures(stem) {
                let plot = &caps[1];
                let first_lot_digit = &caps[2];
                let rest = &stem[caps[0].len()..];
                let fixed_stem = format!("{}-{}{}", plot, first_lot_digit, rest);
                let suggested = match ext {
                    Some(ext) => format!("{}.{}", fixed_stem, ext),
                    None => fixed_stem,
                };
                issues.push(NamingIssue::new(
                    NamingIssueKind::MissingDashAfterPlotId,
                    suggested,
                ));
            }
        }

        issues
    }

    /// Display order for one plot's images: lot descending, then type priority,
    /// unparsable names last in their original order.
    pub fn sort_images(&self, images: &mut [String]) {
        images.sort_by_cached_key(|name| match self.parse(name) {
            Some(parsed) => (
                0u8,
                Reverse(parsed.lot_number),
                self.priority.rank(parsed.image_type),
            ),
            None => (1u8, Reverse(0), 0),
        });
    }

    pub fn sorted(&self, mut images: Vec<String>) -> Vec<String> {
        self.sort_images(&mut images);
        images
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| RecordsError::ConfigError {
        message: format!("invalid filename pattern: {}", e),
    })
}

/// Split on the last dot. A leading dot is part of the stem.
fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => (&filename[..idx], Some(&filename[idx + 1..])),
        _ => (filename, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> FilenameParser {
        FilenameParser::new(ImageTypePriority::default()).unwrap()
    }

    #[test]
    fn test_parse_canonical_name() {
        let parsed = parser().parse("ITC12-3F.jpg").unwrap();
        assert_eq!(parsed.yard_code, "IT");
        assert_eq!(parsed.plot_id, "ITC12");
        assert_eq!(parsed.lot_number, 3);
        assert_eq!(parsed.image_type, Some('F'));
    }

    #[test]
    fn test_trailing_non_type_letter_is_disambiguation() {
        let parsed = parser().parse("NYC4-1M.JPG").unwrap();
        assert_eq!(parsed.plot_id, "NYC4");
        assert_eq!(parsed.lot_number, 1);
        assert_eq!(parsed.image_type, None);
    }

    #[test]
    fn test_disambiguation_letters_before_type() {
        let parsed = parser().parse("ITC12-3aF.jpeg").unwrap();
        assert_eq!(parsed.lot_number, 3);
        assert_eq!(parsed.image_type, Some('F'));

        let parsed = parser().parse("OY7-12.JPEG").unwrap();
        assert_eq!(parsed.plot_id, "OY7");
        assert_eq!(parsed.lot_number, 12);
        assert_eq!(parsed.image_type, None);
    }

    #[test]
    fn test_lowercase_prefix_is_normalized() {
        let parsed = parser().parse("cya1-2B.Jpg").unwrap();
        assert_eq!(parsed.yard_code, "CY");
        assert_eq!(parsed.plot_id, "CYA1");
        assert_eq!(parsed.image_type, Some('B'));
    }

    #[test]
    fn test_non_canonical_names_do_not_match() {
        let p = parser();
        assert!(p.parse("garbage.png").is_none());
        assert!(p.parse("ITC12-3F.png").is_none());
        assert!(p.parse("UTC4.-1.JPG").is_none());
        assert!(p.parse("NYC41M.JPG").is_none());
        assert!(p.parse("NYG2-VP.JPG").is_none());
    }

    #[test]
    fn test_plot_hint() {
        let p = parser();
        assert_eq!(p.plot_hint("NYG2-VP.JPG").as_deref(), Some("NYG2"));
        assert_eq!(p.plot_hint("UTC4.-1.JPG").as_deref(), Some("UTC4"));
        assert_eq!(p.plot_hint("garbage.png"), None);
    }

    #[test]
    fn test_extra_dot_before_dash() {
        let issues = parser().detect_naming_errors("UTC4.-1.JPG");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, NamingIssueKind::ExtraDotBeforeDash);
        assert_eq!(issues[0].reason, "Extra dot before dash");
        assert_eq!(issues[0].suggested, "UTC4-1.JPG");
    }

    #[test]
    fn test_missing_dash_after_plot_id() {
        let issues = parser().detect_naming_errors("NYC41M.JPG");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, NamingIssueKind::MissingDashAfterPlotId);
        assert_eq!(issues[0].suggested, "NYC4-1M.JPG");
    }

    #[test]
    fn test_mixed_case_extension() {
        let issues = parser().detect_naming_errors("CYA1-2.Jpg");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, NamingIssueKind::MixedCaseExtension);
        assert_eq!(issues[0].suggested, "CYA1-2.JPG");

        assert!(parser().detect_naming_errors("CYA1-2.jpg").is_empty());
        assert!(parser().detect_naming_errors("CYA1-2.JPG").is_empty());
    }

    #[test]
    fn test_fixes_are_not_composed() {
        let issues = parser().detect_naming_errors("NYC41M.Jpg");
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].kind, NamingIssueKind::MixedCaseExtension);
        assert_eq!(issues[0].suggested, "NYC41M.JPG");
        assert_eq!(issues[1].kind, NamingIssueKind::MissingDashAfterPlotId);
        assert_eq!(issues[1].suggested, "NYC4-1M.Jpg");
    }

    #[test]
    fn test_suggestion_reparses_to_plot() {
        let p = parser();
        let issues = p.detect_naming_errors("NYC41M.JPG");
        let fixed = p.parse(&issues[0].suggested).unwrap();
        assert_eq!(fixed.plot_id, "NYC4");
    }

    #[test]
    fn test_sort_lot_descending_then_type() {
        // `X-1F.jpg` style names are not canonical, so a real plot id stands in for X
        let images = vec![
            "ITC12-1F.jpg".to_string(),
            "ITC12-2B.jpg".to_string(),
            "ITC12-2F.jpg".to_string(),
        ];
        assert_eq!(
            parser().sorted(images),
            vec!["ITC12-2F.jpg", "ITC12-2B.jpg", "ITC12-1F.jpg"]
        );
    }

    #[test]
    fn test_sort_untyped_after_typed_and_legacy_last() {
        let images = vec![
            "legacy-b.jpg".to_string(),
            "CYA1-1.jpg".to_string(),
            "legacy-a.jpg".to_string(),
            "CYA1-1V.jpg".to_string(),
            "CYA1-1P.jpg".to_string(),
            "CYA1-3B.jpg".to_string(),
        ];
        assert_eq!(
            parser().sorted(images),
            vec![
                "CYA1-3B.jpg",
                "CYA1-1P.jpg",
                "CYA1-1V.jpg",
                "CYA1-1.jpg",
                "legacy-b.jpg",
                "legacy-a.jpg",
            ]
        );
    }

    #[test]
    fn test_injected_priority_changes_order() {
        let p = FilenameParser::new(ImageTypePriority::new(vec!['B', 'F'])).unwrap();
        let sorted = p.sorted(vec!["CYA1-1F.jpg".to_string(), "CYA1-1B.jpg".to_string()]);
        assert_eq!(sorted, vec!["CYA1-1B.jpg", "CYA1-1F.jpg"]);
        // P is no longer a type letter, so it reads as a disambiguation letter
        assert_eq!(p.parse("CYA1-1P.jpg").unwrap().image_type, None);
    }
}
