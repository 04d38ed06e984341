use crate::board::{Layout, Token};
use crate::form::submission::SavedLineup;
use chrono::Local;
use csv::WriterBuilder;
use rand::Rng;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const HEADERS: [&str; 5] = ["slot", "line", "position", "player_id", "player_name"];

/// Name of an export file: `lineup-<date>-<time>-<6 hex>.csv`
pub fn export_file_name() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..0x100_0000);
    format!("lineup-{}-{:06x}.csv", Local::now().format("%Y%m%d-%H%M%S"), suffix)
}

/// Writes one row per filled slot, in layout order
pub fn write_lineup_csv<W: Write>(
    writer: W,
    lineup: &SavedLineup,
    layout: &Layout,
    tokens: &[Token],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(HEADERS)?;

    for (slot_id, token_id) in &lineup.assignments {
        let slot = match layout.slot(slot_id) {
            Some(s) => s,
            None => {
                log::warn!("saved lineup names unknown slot {}, skipping", slot_id);
                continue;
            }
        };
        let name = tokens
            .iter()
            .find(|t| &t.id == token_id)
            .map(|t| t.display_name.as_str())
            .unwrap_or("");
        let line = slot.group.clone().unwrap_or_default();

        wtr.write_record([
            slot_id.as_str(),
            line.as_str(),
            slot.accept_tag.as_str(),
            token_id.as_str(),
            name,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports a saved lineup to a new CSV file in `export_dir` and returns its path
pub fn export_lineup_to_csv(
    lineup: &SavedLineup,
    layout: &Layout,
    tokens: &[Token],
    export_dir: &Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    fs::create_dir_all(export_dir)?;
    let path = export_dir.join(export_file_name());
    let file = fs::File::create(&path)?;
    write_lineup_csv(file, lineup, layout, tokens)?;
    log::info!("exported lineup to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::CapabilityTag;

    fn lineup() -> SavedLineup {
        SavedLineup {
            timestamp: "2026-01-01 12:00:00".to_string(),
            assignments: vec![
                ("L1C".to_string(), "7".to_string()),
                ("G1".to_string(), "1".to_string()),
            ],
            order: Vec::new(),
        }
    }

    fn tokens() -> Vec<Token> {
        vec![
            Token::new("7", "Novak", CapabilityTag::F),
            Token::new("1", "Hasek", CapabilityTag::G),
        ]
    }

    #[test]
    fn writes_header_and_rows() {
        let mut out = Vec::new();
        write_lineup_csv(&mut out, &lineup(), &Layout::lines(1), &tokens()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "slot,line,position,player_id,player_name\nL1C,1,F,7,Novak\nG1,,G,1,Hasek\n"
        );
    }

    #[test]
    fn file_name_has_timestamp_and_token() {
        let name = export_file_name();
        assert!(name.starts_with("lineup-"));
        assert!(name.ends_with(".csv"));
        // lineup- + 8 date + - + 6 time + - + 6 hex + .csv
        assert_eq!(name.len(), 7 + 8 + 1 + 6 + 1 + 6 + 4);
    }

    #[test]
    fn export_creates_file_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("exports");
        let path = export_lineup_to_csv(&lineup(), &Layout::lines(1), &tokens(), &target).unwrap();
        assert!(path.starts_with(&target));
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("L1C,1,F,7,Novak"));
    }
}
