//! Column whitelist for every writable collection.

/// How a column value is stored in SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Bool,
    /// Arrays and objects, stored as JSON text.
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

#[derive(Debug)]
pub struct Collection {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Collection {
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

const fn text(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Text,
    }
}

const fn flag(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Bool,
    }
}

const fn json(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Json,
    }
}

pub const CREATOR_APPLICATIONS: &str = "creator_applications";
pub const THERAPIST_APPLICATIONS: &str = "therapist_applications";

pub static COLLECTIONS: &[Collection] = &[
    Collection {
        name: CREATOR_APPLICATIONS,
        columns: &[
            text("status"),
            text("first_name"),
            text("last_name"),
            text("email"),
            text("state"),
            json("social_profiles"),
            text("motivation"),
            text("veteran_connection"),
            flag("willing_to_share"),
            text("comfort_level"),
            text("fundraising_goal"),
            text("additional_info"),
            flag("agreement_accepted"),
        ],
    },
    Collection {
        name: THERAPIST_APPLICATIONS,
        columns: &[
            text("status"),
            text("first_name"),
            text("last_name"),
            text("email"),
            text("phone"),
            json("licensed_states"),
            text("license_type"),
            flag("telehealth_experience"),
            text("weekly_hours"),
            text("referral_source"),
            text("motivation"),
            flag("agreement_accepted"),
        ],
    },
];

/// Look up a collection by name.
pub fn collection(name: &str) -> Option<&'static Collection> {
    COLLECTIONS.iter().find(|c| c.name == name)
}
