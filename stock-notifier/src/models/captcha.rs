use serde::{Deserialize, Serialize};

/// A request for a human to solve a captcha blocking a checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaPrompt {
    pub retailer: String,
    pub url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl CaptchaPrompt {
    pub fn new(retailer: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            retailer: retailer.into(),
            url: url.into(),
            image_url: None,
            instructions: None,
        }
    }
}

/// What came of a captcha prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptchaOutcome {
    /// A human replied in the prompt's thread
    Answered { reply: String, author_id: u64 },
    /// Nobody replied before the timeout
    TimedOut,
    /// Prompt was posted through a webhook; there is no bot to read replies
    Unattended,
}

impl CaptchaOutcome {
    pub fn reply(&self) -> Option<&str> {
        match self {
            CaptchaOutcome::Answered { reply, .. } => Some(reply),
            _ => None,
        }
    }
}
