// Conversions between the tables read from the files and the records of the draw engines.

use event_draw::*;

use crate::evdraw::config_reader::ColumnNames;
use crate::evdraw::table::{Cell, Table};
use crate::evdraw::*;

struct CoreColumns {
    name: Option<usize>,
    email: Option<usize>,
    role: Option<usize>,
    ticket: Option<usize>,
    status: Option<usize>,
    draw_timestamp: Option<usize>,
}

impl CoreColumns {
    fn find(table: &Table, columns: &ColumnNames) -> CoreColumns {
        CoreColumns {
            name: table.column_index(&columns.name),
            email: table.column_index(&columns.email),
            role: table.column_index(&columns.role),
            ticket: table.column_index(&columns.ticket),
            status: table.column_index(&columns.status),
            draw_timestamp: table.column_index(&columns.draw_timestamp),
        }
    }

    fn contains(&self, col: usize) -> bool {
        [
            self.name,
            self.email,
            self.role,
            self.ticket,
            self.status,
            self.draw_timestamp,
        ]
        .contains(&Some(col))
    }
}

fn require_column(table: &Table, name: &str, source: &str) -> EvDrawResult<usize> {
    table.column_index(name).context(MissingColumnSnafu {
        column: name,
        source_name: source,
    })
}

fn extra_fields(table: &Table, row: usize, core: &CoreColumns) -> Vec<(String, String)> {
    table
        .header
        .iter()
        .enumerate()
        .filter(|(col, _)| !core.contains(*col))
        .map(|(col, h)| (h.clone(), table.text(row, Some(col)).unwrap_or_default()))
        .collect()
}

/// Reads the candidates of a draw.
///
/// The name and ticket columns are mandatory. Rows without a name or a ticket
/// cannot take part in the draw and are skipped with a warning.
pub fn participants_from_table(
    table: &Table,
    columns: &ColumnNames,
    source: &str,
) -> EvDrawResult<Vec<ParticipantRecord>> {
    if table.header.is_empty() {
        return Ok(Vec::new());
    }
    let core = CoreColumns::find(table, columns);
    let name_col = require_column(table, &columns.name, source)?;
    let ticket_col = require_column(table, &columns.ticket, source)?;
    if core.role.is_none() {
        warn!(
            "'{}' has no '{}' column: its participants are classified as '{}'",
            source,
            columns.role,
            Role::Other
        );
    }

    let mut res: Vec<ParticipantRecord> = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let name = table.text(row, Some(name_col));
        let ticket = table.text(row, Some(ticket_col));
        let (name, ticket_id) = match (name, ticket) {
            (Some(n), Some(t)) => (n, t),
            (n, t) => {
                warn!(
                    "'{}': skipping row {} (name: {:?}, ticket: {:?})",
                    source,
                    row + 2,
                    n,
                    t
                );
                continue;
            }
        };
        let status = match core.status {
            None => Status::Present,
            Some(c) => parse_status(table.text(row, Some(c)).as_deref()),
        };
        res.push(ParticipantRecord {
            name,
            email: table.text(row, core.email).unwrap_or_default(),
            ticket_id,
            role: Role::classify(&table.text(row, core.role).unwrap_or_default()),
            status,
            extra: extra_fields(table, row, &core),
        });
    }
    debug!("participants_from_table: {}: {} candidates", source, res.len());
    Ok(res)
}

fn parse_status(raw: Option<&str>) -> Status {
    match Status::parse(raw) {
        Some(s) => s,
        None => {
            warn!("Unknown status {:?}, treated as absent", raw);
            Status::Absent
        }
    }
}

/// Builds the ledger of previous winners. A missing file is an empty ledger.
///
/// Every row of the file is an entry, even incomplete ones: they still count
/// for the tickets they carry.
pub fn ledger_from_table(table: Option<&Table>, columns: &ColumnNames) -> WinnerLedger {
    let table = match table {
        Some(t) if !t.is_empty() => t,
        _ => return WinnerLedger::empty(),
    };
    let core = CoreColumns::find(table, columns);
    let schema = LedgerSchema {
        has_name: core.name.is_some(),
        has_role: core.role.is_some(),
        has_ticket: core.ticket.is_some(),
    };
    debug!("ledger_from_table: schema: {:?}", schema);

    let entries: Vec<WinnerRecord> = (0..table.len())
        .map(|row| WinnerRecord {
            participant: ParticipantRecord {
                name: table.text(row, core.name).unwrap_or_default(),
                email: table.text(row, core.email).unwrap_or_default(),
                ticket_id: table.text(row, core.ticket).unwrap_or_default(),
                role: Role::classify(&table.text(row, core.role).unwrap_or_default()),
                status: Status::parse(table.text(row, core.status).as_deref())
                    .unwrap_or(Status::Absent),
                extra: extra_fields(table, row, &core),
            },
            draw_timestamp: DrawTimestamp::from_raw(
                &table.text(row, core.draw_timestamp).unwrap_or_default(),
            ),
        })
        .collect();
    WinnerLedger::new(schema, entries)
}

// Ticket numbers stay numbers in the spreadsheets.
fn ticket_cell(ticket_id: &str) -> Cell {
    match ticket_id.parse::<i64>() {
        Ok(n) => Cell::Number(n as f64),
        Err(_) => Cell::text(ticket_id),
    }
}

fn text_cell(s: &str) -> Cell {
    if s.is_empty() {
        Cell::Empty
    } else {
        Cell::text(s)
    }
}

/// The rows to add to the ledger file for new winners.
pub fn winners_to_table(winners: &[WinnerRecord], columns: &ColumnNames) -> Table {
    let mut header: Vec<String> = vec![
        columns.name.clone(),
        columns.email.clone(),
        columns.role.clone(),
        columns.ticket.clone(),
        columns.status.clone(),
    ];
    for w in winners {
        for (k, _) in w.participant.extra.iter() {
            if !header.contains(k) {
                header.push(k.clone());
            }
        }
    }
    header.push(columns.draw_timestamp.clone());

    let mut table = Table::new(header);
    for w in winners {
        let p = &w.participant;
        let mut row = vec![
            text_cell(&p.name),
            text_cell(&p.email),
            Cell::text(p.role.label()),
            ticket_cell(&p.ticket_id),
            Cell::text(p.status.label()),
        ];
        for h in table.header[5..table.header.len() - 1].iter() {
            let v = p
                .extra
                .iter()
                .find(|(k, _)| k == h)
                .map(|(_, v)| text_cell(v))
                .unwrap_or(Cell::Empty);
            row.push(v);
        }
        row.push(Cell::text(w.draw_timestamp.as_str()));
        table.push_row(row);
    }
    table
}

/// Reads the survey answers, one row per answer.
///
/// The name and email are usually only filled on the first answer of each
/// participant, they are propagated downwards first.
pub fn answer_rows_from_table(table: &Table, columns: &ColumnNames) -> EvDrawResult<Vec<AnswerRow>> {
    let source = "survey answers";
    let name_col = require_column(table, &columns.name, source)?;
    let email_col = require_column(table, &columns.email, source)?;
    let answer_col = require_column(table, &columns.answers, source)?;

    let mut filled = table.clone();
    filled.forward_fill(&[name_col, email_col]);
    let res = (0..filled.len())
        .map(|row| AnswerRow {
            participant_name: filled.text(row, Some(name_col)),
            participant_email: filled.text(row, Some(email_col)),
            answer_value: filled.raw_text(row, Some(answer_col)),
        })
        .collect();
    Ok(res)
}

/// The identity columns followed by one column per answer.
pub fn pivot_to_table(pivot: &PivotTable, columns: &ColumnNames, prefix: &str) -> Table {
    let mut header = vec![columns.name.clone(), columns.email.clone()];
    header.extend(pivot.column_names(prefix));
    let mut table = Table::new(header);
    for p in pivot.participants.iter() {
        let mut row = vec![text_cell(&p.name), text_cell(&p.email)];
        row.extend(
            p.answers
                .iter()
                .map(|a| a.as_deref().map(Cell::text).unwrap_or(Cell::Empty)),
        );
        table.push_row(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(header: &[&str], rows: &[&[&str]]) -> Table {
        let mut res = Table::new(header.iter().map(|s| s.to_string()).collect());
        for r in rows {
            res.push_row(r.iter().map(|s| text_cell(s)).collect());
        }
        res
    }

    fn pool_table() -> Table {
        table(
            &[
                "nom_du_participant",
                "email",
                "ticket_devenement",
                "numero_ticket",
                "status",
                "telephone",
            ],
            &[
                &["Alice", "a@x", "Visiteur", "1", "present", "0601"],
                &["Bob", "b@x", "Benevole", "2", "present", ""],
                &["", "c@x", "Visiteur", "3", "present", ""],
            ],
        )
    }

    #[test]
    fn reads_candidates() {
        let people = participants_from_table(&pool_table(), &ColumnNames::default(), "pool").unwrap();
        assert_eq!(people.len(), 2);
        assert_eq!(people[0].name, "Alice");
        assert_eq!(people[0].ticket_id, "1");
        assert_eq!(people[0].role, Role::Visitor);
        assert_eq!(people[0].extra, vec![("telephone".to_string(), "0601".to_string())]);
        assert_eq!(people[1].role, Role::Volunteer);
    }

    #[test]
    fn candidates_need_a_ticket_column() {
        let t = table(&["nom_du_participant"], &[&["Alice"]]);
        let err = participants_from_table(&t, &ColumnNames::default(), "pool").unwrap_err();
        assert!(matches!(err, EvDrawError::MissingColumn { .. }));
    }

    #[test]
    fn empty_placeholder_has_no_candidates() {
        let people =
            participants_from_table(&Table::default(), &ColumnNames::default(), "pool").unwrap();
        assert!(people.is_empty());
    }

    #[test]
    fn ledger_schema_follows_the_columns() {
        let old = table(&["numero_ticket", "heure_du_tirage"], &[&["4", "2023-01-01 10:00:00"]]);
        let ledger = ledger_from_table(Some(&old), &ColumnNames::default());
        assert_eq!(
            ledger.schema(),
            LedgerSchema {
                has_name: false,
                has_role: false,
                has_ticket: true
            }
        );
        assert_eq!(ledger.entries()[0].participant.ticket_id, "4");
        assert_eq!(
            ledger.entries()[0].draw_timestamp.as_str(),
            "2023-01-01 10:00:00"
        );

        assert!(ledger_from_table(None, &ColumnNames::default()).is_empty());
    }

    #[test]
    fn winners_rows_keep_every_column() {
        let people = participants_from_table(&pool_table(), &ColumnNames::default(), "pool").unwrap();
        let winners: Vec<WinnerRecord> = people
            .into_iter()
            .map(|p| WinnerRecord {
                participant: p,
                draw_timestamp: DrawTimestamp::from_raw("2024-06-15 20:00:00"),
            })
            .collect();
        let t = winners_to_table(&winners, &ColumnNames::default());
        assert_eq!(
            t.header,
            vec![
                "nom_du_participant",
                "email",
                "ticket_devenement",
                "numero_ticket",
                "status",
                "telephone",
                "heure_du_tirage"
            ]
        );
        assert_eq!(t.rows[0][3], Cell::Number(1.0));
        assert_eq!(t.text(0, Some(5)), Some("0601".to_string()));
        assert_eq!(t.text(1, Some(2)), Some("Benevole".to_string()));
        assert_eq!(t.text(1, Some(6)), Some("2024-06-15 20:00:00".to_string()));

        // Reading the rows back gives the same ledger entries.
        let back = ledger_from_table(Some(&t), &ColumnNames::default());
        assert_eq!(back.entries(), winners.as_slice());
    }

    #[test]
    fn answers_are_forward_filled() {
        let t = table(
            &["nom_du_participant", "email", "reponses_des_participants"],
            &[
                &["Alice", "a@x", "Oui"],
                &["", "", "Non"],
                &["Bob", "b@x", ""],
                &["", "", "Peut-être"],
                &["Carole", "c@x", " À voir "],
            ],
        );
        let rows = answer_rows_from_table(&t, &ColumnNames::default()).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1], AnswerRow::new("Alice", "a@x", Some("Non")));
        assert_eq!(rows[2], AnswerRow::new("Bob", "b@x", None));
        assert_eq!(rows[3], AnswerRow::new("Bob", "b@x", Some("Peut-être")));
        // Answers are kept as typed.
        assert_eq!(rows[4], AnswerRow::new("Carole", "c@x", Some(" À voir ")));
    }

    #[test]
    fn pivot_table_columns() {
        let pivot = PivotTable {
            width: 2,
            participants: vec![PivotedParticipant {
                name: "Bob".to_string(),
                email: "b@x".to_string(),
                answers: vec![Some("Maybe".to_string()), None],
            }],
        };
        let t = pivot_to_table(&pivot, &ColumnNames::default(), "reponse");
        assert_eq!(
            t.header,
            vec!["nom_du_participant", "email", "reponse_1", "reponse_2"]
        );
        assert_eq!(t.rows[0][3], Cell::Empty);
    }
}
