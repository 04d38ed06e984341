use csv::{Reader, ReaderBuilder};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

use crate::board::{CapabilityTag, SlotId, Token, TokenId};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Roster is missing a column for {0}")]
    MissingColumn(&'static str),
}

/// Players of a team plus the lineup the server rendered for them
#[derive(Debug, Clone, Default)]
pub struct RosterData {
    pub tokens: Vec<Token>,
    pub initial: Vec<(SlotId, TokenId)>, // slot -> player, from the optional slot column
}

/// Finds a column whose header contains any of the given fragments (case-insensitive)
fn find_column(headers: &csv::StringRecord, fragments: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let lower = h.trim().to_lowercase();
        fragments.iter().any(|f| lower == *f || lower.contains(f))
    })
}

/// Loads a roster from a CSV file
///
/// # Columns
/// * `id` - stable player id
/// * `name` - display name
/// * `pos` / `position` - F, D or G (long forms like "forward" are accepted)
/// * `slot` - optional, slot the player is currently assigned to
///
/// Rows missing an id or a name, or with an unknown position, are skipped.
/// A later row with the same id replaces the earlier one but keeps its place in the listing.
pub fn load_roster<P: AsRef<Path>>(csv_path: P) -> Result<RosterData, LoadError> {
    let reader = ReaderBuilder::new().flexible(true).from_path(csv_path)?;
    read_roster(reader)
}

/// Loads a roster from any reader (used for uploads)
pub fn load_roster_from_reader<R: Read>(input: R) -> Result<RosterData, LoadError> {
    read_roster(ReaderBuilder::new().flexible(true).from_reader(input))
}

fn read_roster<R: Read>(mut reader: Reader<R>) -> Result<RosterData, LoadError> {
    let headers = reader.headers()?.clone();

    let slot_col = find_column(&headers, &["slot", "assigned"]);
    let id_col = headers
        .iter()
        .position(|h| {
            let lower = h.trim().to_lowercase();
            lower == "id" || lower.ends_with(" id") || lower == "player_id"
        })
        .ok_or(LoadError::MissingColumn("id"))?;
    let name_col = find_column(&headers, &["name"]).ok_or(LoadError::MissingColumn("name"))?;
    let pos_col = find_column(&headers, &["pos", "position"]).ok_or(LoadError::MissingColumn("position"))?;

    // Keep listing order, track rows by player id for replacements
    let mut tokens: Vec<Token> = Vec::new();
    let mut by_id: HashMap<TokenId, usize> = HashMap::new();
    let mut slots: HashMap<TokenId, SlotId> = HashMap::new();

    for result in reader.records() {
        let record = result?;

        let id = record.get(id_col).unwrap_or("").trim().to_string();
        let name = record.get(name_col).unwrap_or("").trim().to_string();
        let pos = record.get(pos_col).unwrap_or("").trim();

        // Skip if essential fields are missing
        if id.is_empty() || name.is_empty() {
            continue;
        }

        let tag = match pos.parse::<CapabilityTag>() {
            Ok(tag) => tag,
            Err(e) => {
                log::warn!("skipping player {} ({}): {}", id, name, e);
                continue;
            }
        };

        let token = Token::new(id.clone(), name, tag);
        match by_id.get(&id) {
            Some(&i) => tokens[i] = token,
            None => {
                by_id.insert(id.clone(), tokens.len());
                tokens.push(token);
            }
        }

        let slot = slot_col
            .and_then(|col| record.get(col))
            .map(str::trim)
            .unwrap_or("");
        if slot.is_empty() {
            slots.remove(&id);
        } else {
            slots.insert(id, slot.to_string());
        }
    }

    // Initial assignments follow listing order
    let initial = tokens
        .iter()
        .filter_map(|t| slots.get(&t.id).map(|s| (s.clone(), t.id.clone())))
        .collect();

    Ok(RosterData { tokens, initial })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(csv: &str) -> RosterData {
        load_roster_from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn reads_players_in_listing_order() {
        let data = parse("id,name,position\n7,Novak,F\n8,Cerny,D\n1,Hasek,goalie\n");
        let ids: Vec<&str> = data.tokens.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["7", "8", "1"]);
        assert_eq!(data.tokens[2].capability_tag, CapabilityTag::G);
        assert!(data.initial.is_empty());
    }

    #[test]
    fn skips_incomplete_and_unknown_rows() {
        let data = parse("id,name,pos\n7,Novak,F\n,Nobody,F\n9,,D\n10,Coach,X\n");
        assert_eq!(data.tokens.len(), 1);
    }

    #[test]
    fn later_rows_replace_earlier_ones() {
        let data = parse("id,name,pos,slot\n7,Novak,F,L1C\n8,Cerny,D,D1LD\n7,Novak Jr,F,\n");
        assert_eq!(data.tokens.len(), 2);
        assert_eq!(data.tokens[0].display_name, "Novak Jr");
        assert_eq!(data.initial, vec![("D1LD".to_string(), "8".to_string())]);
    }

    #[test]
    fn header_text_locates_columns() {
        let data = parse("Position,Player name,Player ID,Assigned slot\nG,Hasek,39,G1\n");
        assert_eq!(data.tokens[0].id, "39");
        assert_eq!(data.tokens[0].display_name, "Hasek");
        assert_eq!(data.initial, vec![("G1".to_string(), "39".to_string())]);
    }

    #[test]
    fn missing_columns_are_reported() {
        let err = load_roster_from_reader("name,pos\nNovak,F\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("id")));
    }
}
