// ********* Input data structures ***********

use chrono::NaiveDateTime;
use snafu::Snafu;
use std::fmt::Display;

/// The kind of ticket a participant registered with.
///
/// Registration exports only carry a free-text ticket label. Use [Role::classify]
/// to map it onto one of these variants.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Role {
    Visitor,
    /// Volunteers may win twice, everyone else once.
    Volunteer,
    Sponsor,
    Other,
}

// Order matters: the first keyword contained in the label wins.
const ROLE_KEYWORDS: [(&str, Role); 4] = [
    ("visiteur", Role::Visitor),
    ("bénévole", Role::Volunteer),
    ("benevole", Role::Volunteer),
    ("commanditaire", Role::Sponsor),
];

impl Role {
    /// Classifies a free-text ticket label.
    ///
    /// The match is a case-insensitive containment test against a fixed keyword
    /// table (`visiteur`, `bénévole`/`benevole`, `commanditaire`). Anything else
    /// is [Role::Other].
    ///
    /// ```
    /// use event_draw::Role;
    /// assert_eq!(Role::classify("Billet Bénévole - samedi"), Role::Volunteer);
    /// assert_eq!(Role::classify("Presse"), Role::Other);
    /// ```
    pub fn classify(label: &str) -> Role {
        let lowered = label.to_lowercase();
        ROLE_KEYWORDS
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword))
            .map(|(_, role)| *role)
            .unwrap_or(Role::Other)
    }

    /// The label written back to the spreadsheets.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Visitor => "Visiteur",
            Role::Volunteer => "Benevole",
            Role::Sponsor => "Commanditaire",
            Role::Other => "Autre",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Attendance status of a participant.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Status {
    Present,
    Absent,
    Registered,
}

impl Status {
    /// Normalizes a raw status cell.
    ///
    /// Returns `None` when the value is not recognized. Missing or blank values
    /// count as absent.
    pub fn parse(raw: Option<&str>) -> Option<Status> {
        let s = raw.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        match s.as_str() {
            "" | "absent" => Some(Status::Absent),
            "présent" | "present" => Some(Status::Present),
            "inscrit" | "registered" => Some(Status::Registered),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Present => "present",
            Status::Absent => "absent",
            Status::Registered => "inscrit",
        }
    }
}

/// A participant, as handed over by the cleaning step.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParticipantRecord {
    pub name: String,
    pub email: String,
    /// Unique per participant. A drawn ticket can never be drawn again.
    pub ticket_id: String,
    pub role: Role,
    pub status: Status,
    /// The other columns of the source row, in source order.
    pub extra: Vec<(String, String)>,
}

impl ParticipantRecord {
    pub fn new(name: &str, email: &str, ticket_id: &str, role: Role) -> ParticipantRecord {
        ParticipantRecord {
            name: name.to_string(),
            email: email.to_string(),
            ticket_id: ticket_id.to_string(),
            role,
            status: Status::Present,
            extra: Vec::new(),
        }
    }
}

/// One survey answer of one participant, in the long layout.
///
/// The position of the answer is not stored: it is the ordinal of the row
/// within its (name, email) group.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AnswerRow {
    pub participant_name: Option<String>,
    pub participant_email: Option<String>,
    pub answer_value: Option<String>,
}

impl AnswerRow {
    pub fn new(name: &str, email: &str, answer: Option<&str>) -> AnswerRow {
        AnswerRow {
            participant_name: Some(name.to_string()),
            participant_email: Some(email.to_string()),
            answer_value: answer.map(|s| s.to_string()),
        }
    }
}

// ******** Output data structures *********

/// Format of the draw timestamps, both in memory and in the ledger file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The moment a winner was drawn.
///
/// Timestamps read back from an existing ledger are kept verbatim, even when
/// they do not follow [TIMESTAMP_FORMAT].
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct DrawTimestamp(String);

impl DrawTimestamp {
    pub fn at(time: NaiveDateTime) -> DrawTimestamp {
        DrawTimestamp(time.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn from_raw(raw: &str) -> DrawTimestamp {
        DrawTimestamp(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parsed(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.0, TIMESTAMP_FORMAT).ok()
    }
}

impl Display for DrawTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct WinnerRecord {
    pub participant: ParticipantRecord,
    pub draw_timestamp: DrawTimestamp,
}

/// Which identity columns the persisted ledger actually carried.
///
/// Old ledgers may predate the role rule and lack some of them.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct LedgerSchema {
    pub has_name: bool,
    pub has_role: bool,
    pub has_ticket: bool,
}

impl LedgerSchema {
    pub const COMPLETE: LedgerSchema = LedgerSchema {
        has_name: true,
        has_role: true,
        has_ticket: true,
    };
}

/// The history of all past winners.
///
/// It only grows: one entry per (participant, draw).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct WinnerLedger {
    schema: LedgerSchema,
    entries: Vec<WinnerRecord>,
}

impl WinnerLedger {
    pub fn empty() -> WinnerLedger {
        WinnerLedger {
            schema: LedgerSchema::COMPLETE,
            entries: Vec::new(),
        }
    }

    pub fn new(schema: LedgerSchema, entries: Vec<WinnerRecord>) -> WinnerLedger {
        WinnerLedger { schema, entries }
    }

    pub fn schema(&self) -> LedgerSchema {
        self.schema
    }

    pub fn entries(&self) -> &[WinnerRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds the winners of a new draw after the existing entries.
    pub fn append(&mut self, winners: &[WinnerRecord]) {
        self.entries.extend_from_slice(winners);
    }
}

/// One participant with all its answers, in the wide layout.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PivotedParticipant {
    pub name: String,
    pub email: String,
    /// Always as long as the width of the table. Missing answers are `None`.
    pub answers: Vec<Option<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PivotTable {
    pub width: usize,
    pub participants: Vec<PivotedParticipant>,
}

impl PivotTable {
    /// The names of the answer columns, starting at 1: `answer_1`, `answer_2`, ...
    pub fn column_names(&self, prefix: &str) -> Vec<String> {
        (1..=self.width).map(|i| format!("{}_{}", prefix, i)).collect()
    }
}

// ********* Errors **********

/// Errors that prevent the pivot from completing.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PivotError {
    #[snafu(display("Row {row}: the participant identity column '{column}' is empty"))]
    Configuration { row: usize, column: &'static str },

    #[snafu(display(
        "Row {row}: answer index {index} cannot be placed in a table of {width} answer columns"
    ))]
    DataShape {
        row: usize,
        index: usize,
        width: usize,
    },
}

/// Errors that abort a draw. A failed draw never returns partial winners.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LotteryError {
    #[snafu(display("The number of winners must be greater than zero (requested {count})"))]
    InvalidRequest { count: i64 },

    #[snafu(display(
        "Not enough eligible participants to draw {} winners: {} available, {} missing",
        requested,
        available,
        requested - available
    ))]
    InsufficientPool { requested: usize, available: usize },
}

impl LotteryError {
    /// How many participants are missing to satisfy the request.
    pub fn shortfall(&self) -> Option<usize> {
        match self {
            LotteryError::InsufficientPool {
                requested,
                available,
            } => Some(requested - available),
            _ => None,
        }
    }
}
