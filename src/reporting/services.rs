//! Manual-submission guides for public reporting services.
//!
//! None of these services accept anonymous automated submissions, so the
//! report carries step-by-step instructions the user can follow instead.

use crate::reporting::ReportCategory;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualGuide {
    pub service: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub steps: Vec<String>,
    pub priority: Priority,
}

/// Builds the guides for reporting `url`, most urgent first.
pub fn manual_guides(url: &str, category: ReportCategory) -> Vec<ManualGuide> {
    let phishing = category == ReportCategory::Phishing;
    let malicious = matches!(category, ReportCategory::Phishing | ReportCategory::Malware);

    let google_form = if category == ReportCategory::Malware {
        "https://safebrowsing.google.com/safebrowsing/report_badware/"
    } else {
        "https://safebrowsing.google.com/safebrowsing/report_phish/"
    };

    let mut guides = vec![
        ManualGuide {
            service: "Google Safe Browsing".to_string(),
            url: google_form.to_string(),
            contact: None,
            steps: vec![
                format!("Open {}", google_form),
                format!("Enter the URL: {}", url),
                "Describe where the QR code was found".to_string(),
                "Complete the verification and submit".to_string(),
            ],
            priority: Priority::High,
        },
        ManualGuide {
            service: "PhishTank".to_string(),
            url: "https://phishtank.org/add_web_phish.php".to_string(),
            contact: None,
            steps: vec![
                "Sign in to PhishTank (a free account is required)".to_string(),
                format!("Submit the URL: {}", url),
                "Name the brand being impersonated, if any".to_string(),
            ],
            priority: if phishing {
                Priority::High
            } else {
                Priority::Low
            },
        },
        ManualGuide {
            service: "Microsoft".to_string(),
            url: "https://www.microsoft.com/en-us/wdsi/support/report-unsafe-site".to_string(),
            contact: None,
            steps: vec![
                "Open the unsafe site report form".to_string(),
                format!("Enter the URL: {}", url),
                format!("Select the threat type: {}", category),
                "Submit the report".to_string(),
            ],
            priority: Priority::Medium,
        },
        ManualGuide {
            service: "APWG".to_string(),
            url: "https://apwg.org/reportphishing/".to_string(),
            contact: Some("reportphishing@apwg.org".to_string()),
            steps: vec![
                "Send an email to reportphishing@apwg.org".to_string(),
                format!("Include the URL: {}", url),
                "Attach a photo of the QR code if you have one".to_string(),
            ],
            priority: if phishing {
                Priority::High
            } else {
                Priority::Medium
            },
        },
        ManualGuide {
            service: "CISA".to_string(),
            url: "https://www.cisa.gov/report".to_string(),
            contact: Some("report@cisa.gov".to_string()),
            steps: vec![
                "Open the CISA incident reporting page".to_string(),
                format!("Report the URL: {}", url),
                "Describe how and where the code was encountered".to_string(),
            ],
            priority: if malicious {
                Priority::Medium
            } else {
                Priority::Low
            },
        },
    ];

    guides.sort_by_key(|g| g.priority);
    guides
}
