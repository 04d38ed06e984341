use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::board::{AssignmentBoard, Token};

/// Formats a player name with its position tag
pub fn format_token_name(token: &Token) -> String {
    if token.display_name.is_empty() {
        format!("[{}] {}", token.capability_tag, token.id)
    } else {
        format!("[{}] {}", token.capability_tag, token.display_name)
    }
}

/// Writes the lineup: one line per slot, grouped by line, goalies last
pub fn write_board<W: Write>(out: &mut W, title: &str, board: &AssignmentBoard) -> io::Result<()> {
    writeln!(out, "** {} **", title)?;

    let layout = board.layout();
    for group in layout.groups() {
        writeln!(out, "Line {}", group)?;
        for slot in layout.slots_in_group(&group) {
            write_slot(out, board, &slot.id)?;
        }
    }

    // Slots outside any line (goalies)
    let loose: Vec<_> = layout.slots().iter().filter(|s| s.group.is_none()).collect();
    if !loose.is_empty() {
        writeln!(out, "Goalies")?;
        for slot in loose {
            write_slot(out, board, &slot.id)?;
        }
    }

    Ok(())
}

fn write_slot<W: Write>(out: &mut W, board: &AssignmentBoard, slot_id: &str) -> io::Result<()> {
    match board.occupant(slot_id) {
        Some(token) => writeln!(out, "  {} {}", slot_id, format_token_name(token)),
        None => writeln!(out, "  {} [EMPTY]", slot_id),
    }
}

/// Writes the lineup to a file
pub fn write_board_to_file<P: AsRef<Path>>(
    title: &str,
    board: &AssignmentBoard,
    filename: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::create(filename)?;
    write_board(&mut file, title, board)?;
    Ok(())
}

/// Prints the lineup and the players left in the pools
pub fn print_board(title: &str, board: &AssignmentBoard) {
    let assigned = board.assignments().len();
    println!("\n=== {} ===", title);
    println!("Slots filled: {}/{}", assigned, board.layout().len());

    let unassigned: Vec<&Token> = board
        .tokens()
        .iter()
        .filter(|t| !board.is_assigned(&t.id))
        .collect();
    if !unassigned.is_empty() {
        println!("Unassigned players ({}):", unassigned.len());
        for token in unassigned {
            println!("  - {} (ID: {})", format_token_name(token), token.id);
        }
    }

    let mut buffer = Vec::new();
    if write_board(&mut buffer, title, board).is_ok() {
        print!("{}", String::from_utf8_lossy(&buffer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CapabilityTag, Layout};

    #[test]
    fn writes_lines_then_goalies() {
        let mut board = AssignmentBoard::new(
            Layout::lines(1),
            vec![
                Token::new("7", "Novak", CapabilityTag::F),
                Token::new("1", "Hasek", CapabilityTag::G),
            ],
        );
        board.place("7", "L1C").unwrap();
        board.place("1", "G1").unwrap();

        let mut out = Vec::new();
        write_board(&mut out, "Game", &board).unwrap();
        let text = String::from_utf8(out).unwrap();
        let expected = "** Game **\nLine 1\n  L1LW [EMPTY]\n  L1C [F] Novak\n  L1RW [EMPTY]\n  D1LD [EMPTY]\n  D1RD [EMPTY]\nGoalies\n  G1 [G] Hasek\n  G2 [EMPTY]\n";
        assert_eq!(text, expected);
    }
}
