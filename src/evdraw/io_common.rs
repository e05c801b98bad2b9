use chrono::NaiveDateTime;
use std::path::Path;

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// The extensions of the files that can be read as a registration export.
pub const SPREADSHEET_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SPREADSHEET_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Normalizes a column name: lower case, no accents, apostrophes removed, and
/// every run of other characters than letters and digits turned into a single `_`.
///
/// `"Numéro  Ticket (n°)"` becomes `"numero_ticket_n"`.
pub fn clean_name(name: &str) -> String {
    let mut res = String::with_capacity(name.len());
    let mut pending_sep = false;
    let mut push = |c: char| {
        if c == '\'' || c == '’' {
            return;
        }
        if c.is_ascii_alphanumeric() {
            if pending_sep && !res.is_empty() {
                res.push('_');
            }
            pending_sep = false;
            res.push(c);
        } else {
            pending_sep = true;
        }
    };
    for c in name.chars().flat_map(|c| c.to_lowercase()) {
        match expand_ligature(c) {
            Some(pair) => pair.chars().for_each(&mut push),
            None => push(strip_accent(c)),
        }
    }
    res
}

fn expand_ligature(c: char) -> Option<&'static str> {
    match c {
        'œ' => Some("oe"),
        'æ' => Some("ae"),
        'ß' => Some("ss"),
        _ => None,
    }
}

// Lower case letters only, `clean_name` lowers first.
fn strip_accent(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' | 'á' | 'ã' | 'å' => 'a',
        'ç' => 'c',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' | 'í' | 'ì' => 'i',
        'ô' | 'ö' | 'ó' | 'ò' | 'õ' | 'ø' => 'o',
        'ù' | 'û' | 'ü' | 'ú' => 'u',
        'ÿ' | 'ý' => 'y',
        'ñ' => 'n',
        x => x,
    }
}

/// `event_registration_pivot` at 14:03:09 becomes
/// `event_registration_pivot_14-03-09.xlsx`.
pub fn timestamped_file_name(stem: &str, time: NaiveDateTime) -> String {
    format!("{}_{}.xlsx", stem, time.format("%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn clean_column_names() {
        assert_eq!(clean_name("Nom du participant"), "nom_du_participant");
        assert_eq!(clean_name("numéro_ticket"), "numero_ticket");
        assert_eq!(clean_name("Ticket d'événement"), "ticket_devenement");
        assert_eq!(clean_name("Ticket d’événement"), "ticket_devenement");
        assert_eq!(clean_name("  Réponses des participants "), "reponses_des_participants");
        assert_eq!(clean_name("Numéro  Ticket (n°)"), "numero_ticket_n");
        assert_eq!(clean_name("Status"), "status");
    }

    #[test]
    fn clean_ligatures() {
        assert_eq!(clean_name("Cœur"), "coeur");
        assert_eq!(clean_name("Vœux du Bénévole"), "voeux_du_benevole");
        assert_eq!(clean_name("Æsthétique"), "aesthetique");
        assert_eq!(clean_name("Søren Straße"), "soren_strasse");
    }

    #[test]
    fn spreadsheet_extensions() {
        assert!(is_spreadsheet(Path::new("a/export.xlsx")));
        assert!(is_spreadsheet(Path::new("EXPORT.XLS")));
        assert!(!is_spreadsheet(Path::new("notes.txt")));
        assert!(!is_spreadsheet(Path::new("noextension")));
        assert!(is_csv(Path::new("pool.CSV")));
        assert!(!is_csv(Path::new("pool.xlsx")));
    }

    #[test]
    fn timestamped_names() {
        let t = NaiveDate::from_ymd_opt(2024, 3, 2)
            .and_then(|d| d.and_hms_opt(14, 3, 9))
            .unwrap();
        assert_eq!(
            timestamped_file_name("event_registration_pivot", t),
            "event_registration_pivot_14-03-09.xlsx"
        );
    }

    #[test]
    fn file_names() {
        assert_eq!(
            simplify_file_name(Path::new("/tmp/out/gagnants.xlsx")),
            "gagnants.xlsx"
        );
    }
}
