/*!

This is the long-form manual for `event_draw` and the `evdraw` command.

## Processing steps

`evdraw all` (the default) runs the three steps below in order. Each step can
also be run alone: `evdraw prepare`, `evdraw pivot`, `evdraw draw`.

### `prepare`

Reads the raw registration export. The input directory must contain exactly one
Excel (`.xlsx`, `.xls`) or CSV file; it is renamed to `event_registration`,
keeping its extension. The step then:

* numbers the rows in a new `numéro_ticket` column (1, 2, 3, ...),
* cleans the column names: lower case, accents removed, every run of
  non-alphanumeric characters replaced by `_` (so `Nom du participant`
  becomes `nom_du_participant` and `numéro_ticket` becomes `numero_ticket`),
* removes the rows and columns that are entirely empty,
* normalizes the ticket type (`ticket_devenement`) to `Visiteur`, `Benevole`,
  `Commanditaire` or `Autre`,
* normalizes the `status` column to `present`, `absent` or `inscrit`.

The whole table is saved as `event_registration_cleaned.xlsx`, and the present
participants of each role as `event_registration_visiteurs.xlsx`,
`event_registration_benevoles.xlsx` and `event_registration_sponsors.xlsx`.

### `pivot`

Reads `event_registration_cleaned.xlsx`, where each survey answer
(`reponses_des_participants`) sits on its own row. Exports often leave the
name and the email blank on the rows following the first answer of a
participant: these are filled from the previous row.

The output has one row per (name, email) pair and the columns `reponse_1`,
`reponse_2`, ... The number of columns is the largest number of answers given
by a participant; the others have empty cells at the end. With
`--merge-details`, the other columns of the first row of each participant are
added. The file is named `event_registration_pivot_HH-MM-SS.xlsx` so that
successive runs do not overwrite each other.

### `draw`

Reads the visitors and the volunteers files (a missing file counts as empty)
and the ledger of previous winners, `gagnants_combines.xlsx`, if it exists.

| Role                       | Wins allowed |
|----------------------------|--------------|
| `Benevole`                 | 2            |
| `Visiteur`, `Commanditaire`, `Autre` | 1  |

Whatever the role, a ticket number that is already in the ledger is never drawn
again. The repeat-win limits apply to names across all tickets.

The number of winners is given with `--count` or asked on the terminal. The
draw is uniform over the eligible tickets and happens completely or not at
all: if fewer tickets are eligible than requested, nothing is written. The new
winners are added to the end of the ledger with the time of the draw in the
`heure_du_tirage` column (`YYYY-MM-DD HH:MM:SS`). Older rows are never
modified.

If the ledger has no name or no role column (it was written by an older
version), the repeat-win limits cannot be applied: a warning is logged and only
the ticket numbers are excluded.

## Configuration file

All the names above can be changed with a JSON file passed with `--config`:

```json
{
  "inputDirectory": "input_files",
  "outputDirectory": "output_files",
  "inputFileName": "event_registration.xlsx",
  "poolFiles": ["event_registration_visiteurs.xlsx", "event_registration_benevoles.xlsx"],
  "winnersFile": "gagnants_combines.xlsx",
  "answerColumnPrefix": "reponse",
  "randomSeed": 1234,
  "columns": {
    "name": "nom_du_participant",
    "email": "email",
    "role": "ticket_devenement",
    "ticket": "numero_ticket",
    "status": "status",
    "answers": "reponses_des_participants",
    "drawTimestamp": "heure_du_tirage"
  }
}
```

Every entry is optional. `randomSeed` makes the draws reproducible and should
only be used for rehearsals.

*/
