//! Wizard definitions: the steps of each application form and the rule table of every step.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::{CREATOR_APPLICATIONS, THERAPIST_APPLICATIONS};
use crate::validation::{FieldRule, Rule};

use super::FormState;

/// One page of a wizard.
#[derive(Debug)]
pub struct StepDef {
    pub key: &'static str,
    pub label: &'static str,
    pub fields: &'static [FieldRule],
}

/// The application wizards offered by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardKind {
    /// Creator Challenge fundraising application.
    Creator,
    /// Therapist recruitment application.
    Therapist,
}

impl WizardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardKind::Creator => "creator",
            WizardKind::Therapist => "therapist",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "creator" => Some(WizardKind::Creator),
            "therapist" => Some(WizardKind::Therapist),
            _ => None,
        }
    }

    /// Record collection the wizard writes to.
    pub fn collection(&self) -> &'static str {
        match self {
            WizardKind::Creator => CREATOR_APPLICATIONS,
            WizardKind::Therapist => THERAPIST_APPLICATIONS,
        }
    }

    pub fn steps(&self) -> &'static [StepDef] {
        match self {
            WizardKind::Creator => CREATOR_STEPS,
            WizardKind::Therapist => THERAPIST_STEPS,
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps().len()
    }

    /// Values a freshly opened wizard starts with.
    pub fn blank_form(&self) -> FormState {
        match self {
            WizardKind::Creator => FormState::from_value(json!({
                SOCIAL_PROFILES: [blank_social_profile()],
            })),
            WizardKind::Therapist => FormState::from_value(json!({ LICENSED_STATES: [] })),
        }
    }

    /// Blank entry appended to a repeated list field, if `field` is one.
    pub fn list_entry_template(&self, field: &str) -> Option<Value> {
        match (self, field) {
            (WizardKind::Creator, SOCIAL_PROFILES) => Some(blank_social_profile()),
            _ => None,
        }
    }

    /// Message shown once the application is submitted.
    pub fn confirmation(&self) -> &'static str {
        match self {
            WizardKind::Creator => {
                "Thank you for applying to the Creator Challenge. We'll review your application and be in touch soon."
            }
            WizardKind::Therapist => {
                "Thank you for your interest in joining ValorWell. We'll review your application and be in touch soon."
            }
        }
    }
}

fn blank_social_profile() -> Value {
    json!({ "platform": "", "handle": "", "followers": 0 })
}

/// Storage column for a camelCase field path.
pub fn column_name(path: &str) -> String {
    let mut column = String::with_capacity(path.len() + 4);
    for ch in path.chars() {
        if ch.is_ascii_uppercase() {
            column.push('_');
            column.push(ch.to_ascii_lowercase());
        } else {
            column.push(ch);
        }
    }
    column
}

pub const SOCIAL_PROFILES: &str = "socialProfiles";
pub const LICENSED_STATES: &str = "licensedStates";
pub const AGREEMENT_ACCEPTED: &str = "agreementAccepted";

const AGREEMENT: FieldRule = FieldRule {
    path: AGREEMENT_ACCEPTED,
    rule: Rule::AcceptTrue {
        message: "You must accept the agreement to submit your application",
    },
};

const FIRST_NAME: FieldRule = FieldRule {
    path: "firstName",
    rule: Rule::RequiredText {
        min: 1,
        max: 100,
        message: "First name is required",
    },
};

const LAST_NAME: FieldRule = FieldRule {
    path: "lastName",
    rule: Rule::RequiredText {
        min: 1,
        max: 100,
        message: "Last name is required",
    },
};

const EMAIL: FieldRule = FieldRule {
    path: "email",
    rule: Rule::Email { max: 255 },
};

// ---------------------------------------------------------------------------
// Creator Challenge application
// ---------------------------------------------------------------------------

const STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY",
];

const PLATFORMS: &[&str] = &[
    "TikTok",
    "Instagram",
    "YouTube",
    "LinkedIn",
    "Facebook",
    "X (Twitter)",
    "Podcast",
    "Other",
];

const VETERAN_CONNECTIONS: &[&str] = &[
    "I'm a veteran",
    "Military spouse/family",
    "I work with veterans professionally",
    "I support veterans but no direct connection",
    "Prefer not to say",
];

const COMFORT_LEVELS: &[&str] = &[
    "Very comfortable",
    "Somewhat comfortable",
    "Not very comfortable, but I'm willing to learn",
];

const FUNDRAISING_GOALS: &[&str] = &[
    "10 sessions ($500)",
    "25 sessions ($1,250)",
    "50 sessions ($2,500)",
    "100 sessions ($5,000+)",
    "Not sure yet",
];

static CREATOR_STEPS: &[StepDef] = &[
    StepDef {
        key: "basic_info",
        label: "Basic Info",
        fields: &[
            FIRST_NAME,
            LAST_NAME,
            EMAIL,
            FieldRule {
                path: "state",
                rule: Rule::Choice {
                    allowed: STATE_CODES,
                    message: "Select your state",
                },
            },
        ],
    },
    StepDef {
        key: "social_profiles",
        label: "Social Profiles",
        fields: &[FieldRule {
            path: SOCIAL_PROFILES,
            rule: Rule::SocialProfiles {
                platforms: PLATFORMS,
            },
        }],
    },
    StepDef {
        key: "motivation",
        label: "Fit and Motivation",
        fields: &[
            FieldRule {
                path: "motivation",
                rule: Rule::RequiredText {
                    min: 1,
                    max: 5000,
                    message: "This field is required",
                },
            },
            FieldRule {
                path: "veteranConnection",
                rule: Rule::OptionalChoice {
                    allowed: VETERAN_CONNECTIONS,
                },
            },
        ],
    },
    StepDef {
        key: "fundraising",
        label: "Fundraising Readiness",
        fields: &[
            FieldRule {
                path: "willingToShare",
                rule: Rule::YesNo {
                    message: "Select yes or no",
                },
            },
            FieldRule {
                path: "comfortLevel",
                rule: Rule::Choice {
                    allowed: COMFORT_LEVELS,
                    message: "Select your comfort level",
                },
            },
            FieldRule {
                path: "fundraisingGoal",
                rule: Rule::Choice {
                    allowed: FUNDRAISING_GOALS,
                    message: "Select a fundraising goal",
                },
            },
            FieldRule {
                path: "additionalInfo",
                rule: Rule::OptionalText { max: 5000 },
            },
        ],
    },
    StepDef {
        key: "agreement",
        label: "Agreement",
        fields: &[AGREEMENT],
    },
];

// ---------------------------------------------------------------------------
// Therapist application
// ---------------------------------------------------------------------------

const STATE_NAMES: &[&str] = &[
    "Alabama",
    "Alaska",
    "Arizona",
    "Arkansas",
    "California",
    "Colorado",
    "Connecticut",
    "Delaware",
    "Florida",
    "Georgia",
    "Hawaii",
    "Idaho",
    "Illinois",
    "Indiana",
    "Iowa",
    "Kansas",
    "Kentucky",
    "Louisiana",
    "Maine",
    "Maryland",
    "Massachusetts",
    "Michigan",
    "Minnesota",
    "Mississippi",
    "Missouri",
    "Montana",
    "Nebraska",
    "Nevada",
    "New Hampshire",
    "New Jersey",
    "New Mexico",
    "New York",
    "North Carolina",
    "North Dakota",
    "Ohio",
    "Oklahoma",
    "Oregon",
    "Pennsylvania",
    "Rhode Island",
    "South Carolina",
    "South Dakota",
    "Tennessee",
    "Texas",
    "Utah",
    "Vermont",
    "Virginia",
    "Washington",
    "West Virginia",
    "Wisconsin",
    "Wyoming",
];

const LICENSE_TYPES: &[&str] = &[
    "Psychologist",
    "Professional Counselor",
    "Clinical Social Worker",
    "Mental Health Counselor",
    "Marriage & Family Therapist",
];

const REFERRAL_SOURCES: &[&str] = &[
    "Friend",
    "Online Search",
    "LinkedIn",
    "Social Media",
    "Email",
    "Online Job Posting",
];

const WEEKLY_HOURS: &[&str] = &[
    "30+ hours a week",
    "20-30 hours a week",
    "10-20 hours a week",
    "Whenever I find time",
];

static THERAPIST_STEPS: &[StepDef] = &[
    StepDef {
        key: "personal_info",
        label: "Personal Information",
        fields: &[
            FIRST_NAME,
            LAST_NAME,
            EMAIL,
            FieldRule {
                path: "phone",
                rule: Rule::RequiredText {
                    min: 10,
                    max: 20,
                    message: "Phone number must be at least 10 digits",
                },
            },
        ],
    },
    StepDef {
        key: "licensure",
        label: "Licensure",
        fields: &[
            FieldRule {
                path: LICENSED_STATES,
                rule: Rule::MultiChoice {
                    allowed: STATE_NAMES,
                    min: 1,
                    message: "Select at least one state",
                },
            },
            FieldRule {
                path: "licenseType",
                rule: Rule::Choice {
                    allowed: LICENSE_TYPES,
                    message: "Select a license type",
                },
            },
        ],
    },
    StepDef {
        key: "experience",
        label: "Experience and Availability",
        fields: &[
            FieldRule {
                path: "telehealthExperience",
                rule: Rule::YesNo {
                    message: "Select yes or no",
                },
            },
            FieldRule {
                path: "weeklyHours",
                rule: Rule::Choice {
                    allowed: WEEKLY_HOURS,
                    message: "Select your availability",
                },
            },
        ],
    },
    StepDef {
        key: "motivation",
        label: "Motivation",
        fields: &[
            FieldRule {
                path: "referralSource",
                rule: Rule::Choice {
                    allowed: REFERRAL_SOURCES,
                    message: "Select how you heard about us",
                },
            },
            FieldRule {
                path: "motivation",
                rule: Rule::RequiredText {
                    min: 10,
                    max: 2000,
                    message: "Please provide more detail",
                },
            },
        ],
    },
    StepDef {
        key: "agreement",
        label: "Agreement",
        fields: &[AGREEMENT],
    },
];
