use crate::evdraw::*;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The names of the columns, after cleaning.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub name: String,
    pub email: String,
    pub role: String,
    pub ticket: String,
    pub status: String,
    pub answers: String,
    #[serde(rename = "drawTimestamp")]
    pub draw_timestamp: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            name: "nom_du_participant".to_string(),
            email: "email".to_string(),
            role: "ticket_devenement".to_string(),
            ticket: "numero_ticket".to_string(),
            status: "status".to_string(),
            answers: "reponses_des_participants".to_string(),
            draw_timestamp: "heure_du_tirage".to_string(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    #[serde(rename = "inputDirectory")]
    pub input_directory: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: String,
    #[serde(rename = "inputFileName")]
    pub input_file_name: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    /// The files holding the candidates of the draw, relative to the output directory.
    #[serde(rename = "poolFiles")]
    pub pool_files: Vec<String>,
    #[serde(rename = "winnersFile")]
    pub winners_file: String,
    #[serde(rename = "answerColumnPrefix")]
    pub answer_column_prefix: String,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<u64>,
    pub columns: ColumnNames,
}

impl Default for EventConfig {
    fn default() -> Self {
        EventConfig {
            input_directory: "input_files".to_string(),
            output_directory: "output_files".to_string(),
            input_file_name: "event_registration.xlsx".to_string(),
            excel_worksheet_name: None,
            pool_files: vec![
                "event_registration_visiteurs.xlsx".to_string(),
                "event_registration_benevoles.xlsx".to_string(),
            ],
            winners_file: "gagnants_combines.xlsx".to_string(),
            answer_column_prefix: "reponse".to_string(),
            random_seed: None,
            columns: ColumnNames::default(),
        }
    }
}

impl EventConfig {
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        [self.output_directory.as_str(), file_name].iter().collect()
    }

    pub fn cleaned_path(&self) -> PathBuf {
        self.output_path("event_registration_cleaned.xlsx")
    }

    pub fn winners_path(&self) -> PathBuf {
        self.output_path(&self.winners_file)
    }

    pub fn pool_paths(&self) -> Vec<PathBuf> {
        self.pool_files.iter().map(|f| self.output_path(f)).collect()
    }
}

pub fn read_config(path: &str) -> EvDrawResult<EventConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_config: {:?}", contents);
    let config: EventConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}
