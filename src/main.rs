use clap::Parser;

use lineup_board::board::{AssignmentBoard, Layout};
use lineup_board::colors::JsonFileStore;
use lineup_board::config::{Cli, Command, ServeArgs, ShowArgs};
use lineup_board::display::{print_board, write_board_to_file};
use lineup_board::parser::{load_roster, RosterData};
use lineup_board::web::{start_server, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(args).await?,
        Command::Show(args) => show(args)?,
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let roster = match &args.roster {
        Some(path) => {
            println!("Loading roster from {}...", path.display());
            let data = load_roster(path)?;
            println!("Loaded {} players", data.tokens.len());
            data
        }
        None => RosterData::default(),
    };

    let prefs = JsonFileStore::open_or_empty(&args.prefs);
    let state = AppState::new(
        roster,
        Box::new(prefs),
        args.admin_password,
        args.export_dir,
        args.lines,
    );

    println!("Starting web server on port {}...", args.port);
    println!("Access the lines page at http://localhost:{}/lines", args.port);
    log::info!("serving {} lines", args.lines);

    start_server(args.port, state).await?;
    Ok(())
}

fn show(args: ShowArgs) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading roster from {}...", args.roster.display());
    let data = load_roster(&args.roster)?;
    println!("Loaded {} players", data.tokens.len());

    let board = AssignmentBoard::hydrate(Layout::lines(args.lines), data.tokens, data.initial);
    print_board("Lineup", &board);

    if let Some(out) = &args.out {
        write_board_to_file("Lineup", &board, out)?;
        println!("Lineup saved to {}", out.display());
    }

    Ok(())
}
