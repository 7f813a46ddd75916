use serde::{Deserialize, Serialize};

/// Form payload sent to the scan webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    pub job_description: String,
    pub folder_name: String,
}

impl ScanRequest {
    /// Both fields must carry non-whitespace text before anything is forwarded.
    pub fn is_complete(&self) -> bool {
        !self.job_description.trim().is_empty() && !self.folder_name.trim().is_empty()
    }
}

/// Candidate analysis returned by the automation workflow.
///
/// The proxy endpoint relays the upstream JSON verbatim; this type is only
/// used when the result is rendered server-side, so every field tolerates
/// being absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub contact: String,
    /// "shortlisted", or free text for anything else.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub score: ScanScore,
    #[serde(default)]
    pub reason: String,
}

impl ScanResult {
    pub fn is_shortlisted(&self) -> bool {
        self.status == "shortlisted"
    }

    /// `85` renders as "85%", `72.5` as "72.5%", `"85"` as "85%".
    pub fn score_label(&self) -> String {
        match &self.score {
            ScanScore::Number(n) if n.fract() == 0.0 => format!("{n:.0}%"),
            ScanScore::Number(n) => format!("{n}%"),
            ScanScore::Text(s) => format!("{s}%"),
        }
    }
}

/// Score as sent by the workflow. Usually a number, but some workflows emit
/// it as a string; either is shown as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScanScore {
    Number(f64),
    Text(String),
}

impl Default for ScanScore {
    fn default() -> Self {
        ScanScore::Number(0.0)
    }
}

/// One stage of the workflow as presented in the "how it works" panel.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScanStep {
    pub title: &'static str,
    pub desc: &'static str,
}

pub const SCAN_STEPS: [ScanStep; 6] = [
    ScanStep {
        title: "Search Folder",
        desc: "Find resumes inside Google Drive folder.",
    },
    ScanStep {
        title: "Extract Text",
        desc: "Parse resumes into clean text.",
    },
    ScanStep {
        title: "AI Analysis",
        desc: "Match resumes with job description.",
    },
    ScanStep {
        title: "Score & Status",
        desc: "AI suggests shortlist/reject.",
    },
    ScanStep {
        title: "Save to Sheets",
        desc: "Store results in Google Sheets.",
    },
    ScanStep {
        title: "Send Email",
        desc: "Automatic send email to candidate",
    },
];

/// Client-side progress animation: (highlighted step, percent) pairs.
/// The first three play before the request is sent, the last two after it
/// returns. They are timed, not reported by the backend.
pub const PROGRESS_MARKS: [(usize, u8); 5] = [(0, 15), (1, 40), (2, 65), (3, 90), (4, 100)];

/// Number of progress marks shown before the request goes out.
pub const MARKS_BEFORE_REQUEST: usize = 3;

pub const PROGRESS_STEP_DELAY_MS: u64 = 500;
