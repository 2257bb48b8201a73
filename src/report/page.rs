use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;

/// Top-level menu entries of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Page {
    Home,
    ViewDataset,
    AnalyzeData,
    Visualization,
    Conclusion,
}

impl Page {
    pub const OPTIONS: [Page; 5] = [
        Page::Home,
        Page::ViewDataset,
        Page::AnalyzeData,
        Page::Visualization,
        Page::Conclusion,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::ViewDataset => "View Dataset",
            Page::AnalyzeData => "Analyze Data",
            Page::Visualization => "Visualization",
            Page::Conclusion => "Conclusion",
        }
    }

    pub fn requires_data(&self) -> bool {
        matches!(
            self,
            Page::ViewDataset | Page::AnalyzeData | Page::Visualization
        )
    }

    pub fn uses_filters(&self) -> bool {
        matches!(self, Page::AnalyzeData | Page::Visualization)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

impl FromStr for Page {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match normalized.as_str() {
            "home" => Ok(Page::Home),
            "view" | "viewdataset" | "dataset" => Ok(Page::ViewDataset),
            "analyze" | "analyzedata" | "analysis" => Ok(Page::AnalyzeData),
            "visualization" | "visualize" | "charts" => Ok(Page::Visualization),
            "conclusion" | "conclusions" => Ok(Page::Conclusion),
            _ => Err(ReportError::unknown("page", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_names() {
        assert_eq!("View Dataset".parse::<Page>().unwrap(), Page::ViewDataset);
        assert_eq!("analyze-data".parse::<Page>().unwrap(), Page::AnalyzeData);
        assert_eq!("visualize".parse::<Page>().unwrap(), Page::Visualization);
        for page in Page::OPTIONS {
            assert_eq!(page.title().parse::<Page>().unwrap(), page);
        }
        assert!("settings".parse::<Page>().is_err());
    }

    #[test]
    fn test_page_requirements() {
        assert!(!Page::Home.requires_data());
        assert!(Page::ViewDataset.requires_data());
        assert!(!Page::ViewDataset.uses_filters());
        assert!(Page::Visualization.uses_filters());
    }
}
